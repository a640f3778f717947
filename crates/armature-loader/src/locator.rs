//! Resource location.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use log::trace;

use crate::error::{Diagnostic, ErrorCode, Result};

/// Turns a resource name into the path of a readable file.
pub trait ResourceLocator: fmt::Debug {
    /// Locate `name`, looking in `current_dir` before anywhere else.
    fn locate(&self, name: &str, current_dir: Option<&Path>) -> Result<PathBuf>;
}

/// Locates files on disk.
///
/// Absolute names are used as they are. Relative names are tried in the
/// current directory, then in each configured search path.
#[derive(Debug, Clone, Default)]
pub struct FileLocator {
    paths: Vec<PathBuf>,
}

impl FileLocator {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl ResourceLocator for FileLocator {
    fn locate(&self, name: &str, current_dir: Option<&Path>) -> Result<PathBuf> {
        let candidate = Path::new(name);

        let searched: Vec<&Path> = if candidate.is_absolute() {
            Vec::new()
        } else {
            current_dir
                .into_iter()
                .chain(self.paths.iter().map(PathBuf::as_path))
                .collect()
        };

        let found = if candidate.is_absolute() {
            candidate.is_file().then(|| candidate.to_path_buf())
        } else {
            searched
                .iter()
                .map(|dir| dir.join(candidate))
                .find(|path| path.is_file())
        };

        match found {
            Some(path) => {
                let path = path.canonicalize().unwrap_or(path);
                trace!(name, path:? = path; "Located resource");
                Ok(path)
            }
            None if searched.is_empty() => Err(Diagnostic::error(format!(
                "the file \"{name}\" does not exist"
            ))
            .with_code(ErrorCode::E004)),
            None => Err(Diagnostic::error(format!(
                "the file \"{name}\" does not exist (in: {})",
                searched
                    .iter()
                    .map(|dir| format!("\"{}\"", dir.display()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .with_code(ErrorCode::E004)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_locate_prefers_current_dir() {
        let current = tempfile::tempdir().expect("tempdir");
        let search = tempfile::tempdir().expect("tempdir");
        fs::write(current.path().join("services.xml"), "<container/>").expect("write");
        fs::write(search.path().join("services.xml"), "<container/>").expect("write");

        let locator = FileLocator::new(vec![search.path().to_path_buf()]);
        let path = locator
            .locate("services.xml", Some(current.path()))
            .expect("located");

        assert_eq!(
            path,
            current.path().join("services.xml").canonicalize().expect("canonical")
        );
    }

    #[test]
    fn test_locate_falls_back_to_search_paths() {
        let search = tempfile::tempdir().expect("tempdir");
        fs::create_dir(search.path().join("config")).expect("mkdir");
        fs::write(search.path().join("config/services.xml"), "<container/>").expect("write");

        let locator = FileLocator::new(vec![search.path().to_path_buf()]);
        let path = locator.locate("config/services.xml", None).expect("located");

        assert!(path.ends_with("config/services.xml"));
    }

    #[test]
    fn test_locate_absolute() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("services.xml");
        fs::write(&file, "<container/>").expect("write");

        let locator = FileLocator::default();
        let name = file.to_string_lossy();
        assert!(locator.locate(&name, None).is_ok());
        assert!(locator.locate(&format!("{name}.missing"), None).is_err());
    }

    #[test]
    fn test_locate_missing_lists_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let locator = FileLocator::new(vec![PathBuf::from("/nonexistent/config")]);

        let err = locator
            .locate("missing.xml", Some(dir.path()))
            .expect_err("missing file");

        assert_eq!(err.code(), Some(ErrorCode::E004));
        assert!(err.message().contains("/nonexistent/config"));
        assert!(err.message().contains(&dir.path().display().to_string()));
    }
}
