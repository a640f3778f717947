//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use armature::{ArmatureError, config::LoaderConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

impl From<ConfigError> for ArmatureError {
    fn from(err: ConfigError) -> Self {
        ArmatureError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (armature/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<LoaderConfig, ArmatureError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("armature/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("dev", "armature", "armature") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(LoaderConfig::default())
}

/// Load configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<LoaderConfig, ArmatureError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;

    let config: LoaderConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    use armature::scalar::Scalar;

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
search_paths = ["config", "vendor/config"]
max_nesting_depth = 8
validate_schema = false

[constants]
APP_ENV = "prod"
APP_DEBUG = false
PAGE_SIZE = 50

[[extensions]]
namespace = "http://acme.dev/schema/dic/acme"
alias = "acme"
schema = "schemas/acme"
"#,
        )
        .expect("write config");

        let config = load_config(Some(&path)).expect("config loads");

        assert_eq!(config.search_paths().len(), 2);
        assert_eq!(config.max_nesting_depth(), 8);
        assert!(!config.validate_schema());
        assert_eq!(config.constants().get("APP_ENV"), Some(&Scalar::from("prod")));
        assert_eq!(config.constants().get("APP_DEBUG"), Some(&Scalar::Bool(false)));
        assert_eq!(config.constants().get("PAGE_SIZE"), Some(&Scalar::Int(50)));

        let extension = &config.extensions()[0];
        assert_eq!(extension.alias(), "acme");
        assert_eq!(extension.schema(), Some(Path::new("schemas/acme")));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "search_paths = [\"config\"]\n").expect("write config");

        let config = load_config(Some(&path)).expect("config loads");

        assert_eq!(config.max_nesting_depth(), 32);
        assert!(config.validate_schema());
        assert!(config.extensions().is_empty());
    }

    #[test]
    fn test_missing_explicit_config() {
        let err = load_config(Some("/nonexistent/armature.toml")).expect_err("missing file");
        assert!(matches!(err, ArmatureError::Config(_)));
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_nesting_depth = \"deep\"\n").expect("write config");

        let err = load_config(Some(&path)).expect_err("invalid config");
        assert!(err.to_string().contains("Failed to parse TOML configuration"));
    }
}
