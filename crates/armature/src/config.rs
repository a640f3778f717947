//! Configuration types for loading container documents.
//!
//! All types implement [`serde::Deserialize`] so a configuration can be read
//! from an external file.
//!
//! # Overview
//!
//! - [`LoaderConfig`] - Top-level configuration: search paths, host constants,
//!   nesting bound, schema validation and extensions.
//! - [`ExtensionConfig`] - A passthrough extension that records the
//!   configuration it receives.
//!
//! # Example
//!
//! ```
//! # use armature::config::LoaderConfig;
//! let config = LoaderConfig::default();
//! assert_eq!(config.max_nesting_depth(), 32);
//! assert!(config.validate_schema());
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use armature_core::scalar::Scalar;
use armature_loader::{DEFAULT_MAX_NESTING_DEPTH, DeclaredExtension, LoaderOptions, SchemaSource};

/// Top-level loader configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Directories searched for resources not found next to the importing file.
    #[serde(default)]
    search_paths: Vec<PathBuf>,

    /// Host constants available to `type="constant"` arguments.
    #[serde(default)]
    constants: IndexMap<String, Scalar>,

    /// Bound on inline service nesting.
    #[serde(default = "default_max_nesting_depth")]
    max_nesting_depth: usize,

    /// Whether documents are validated before they are resolved.
    #[serde(default = "default_validate_schema")]
    validate_schema: bool,

    /// Extensions that accept foreign-namespace configuration.
    #[serde(default)]
    extensions: Vec<ExtensionConfig>,
}

fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}

fn default_validate_schema() -> bool {
    true
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            constants: IndexMap::new(),
            max_nesting_depth: default_max_nesting_depth(),
            validate_schema: default_validate_schema(),
            extensions: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Adds a directory to search for resources.
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Defines a host constant.
    pub fn with_constant(mut self, name: impl Into<String>, value: Scalar) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_schema_validation(mut self, enabled: bool) -> Self {
        self.validate_schema = enabled;
        self
    }

    /// Adds a passthrough extension.
    pub fn with_extension(mut self, extension: ExtensionConfig) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Returns the resource search paths.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Returns the host constants.
    pub fn constants(&self) -> &IndexMap<String, Scalar> {
        &self.constants
    }

    /// Returns the inline nesting bound.
    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    /// Returns `true` when documents are validated.
    pub fn validate_schema(&self) -> bool {
        self.validate_schema
    }

    /// Returns the configured extensions.
    pub fn extensions(&self) -> &[ExtensionConfig] {
        &self.extensions
    }

    pub(crate) fn loader_options(&self) -> LoaderOptions {
        self.constants.iter().fold(
            LoaderOptions::new()
                .with_max_nesting_depth(self.max_nesting_depth)
                .with_schema_validation(self.validate_schema),
            |options, (name, value)| options.with_constant(name.clone(), value.clone()),
        )
    }
}

/// A passthrough extension.
///
/// Configuration found under `namespace` is recorded under `alias`. When a
/// `schema` directory is given, schema locations declared for the namespace
/// are looked up in it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtensionConfig {
    namespace: String,
    alias: String,
    #[serde(default)]
    schema: Option<PathBuf>,
}

impl ExtensionConfig {
    pub fn new(namespace: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            alias: alias.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<PathBuf>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn schema(&self) -> Option<&Path> {
        self.schema.as_deref()
    }

    pub(crate) fn to_extension(&self) -> DeclaredExtension {
        let extension = DeclaredExtension::new(&self.namespace, &self.alias);
        match &self.schema {
            Some(schema) => extension.with_schema(SchemaSource::Directory(schema.clone())),
            None => extension,
        }
    }
}
