//! Armature - loads declarative service container definitions.
//!
//! Reads XML container documents and resolves them into a registry of
//! service blueprints: fully resolved construction recipes ready for a
//! container runtime to instantiate.

pub mod config;

mod error;

pub use armature_core::{argument, blueprint, config_value, parameter, registry, scalar};
pub use armature_loader::{
    ContainerBuilder, LoadReport,
    error::{Diagnostic, ErrorCode, Severity},
};

pub use error::ArmatureError;

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, trace};

use armature_loader::{FileLocator, Loader, XmlFileLoader, error::LoadError};

use config::LoaderConfig;

/// Builder for loading Armature container documents.
///
/// # Examples
///
/// ```rust,no_run
/// use armature::{ContainerLoader, config::LoaderConfig};
///
/// // With custom config
/// let config = LoaderConfig::default().with_search_path("config");
/// let loader = ContainerLoader::new(config);
///
/// let loaded = loader.load("config/services.xml")
///     .expect("Failed to load");
///
/// for (id, entry) in loaded.container().registry().iter() {
///     println!("{id}: {}", entry.kind());
/// }
///
/// // Or use default config
/// let loader = ContainerLoader::default();
/// ```
#[derive(Debug, Default)]
pub struct ContainerLoader {
    config: LoaderConfig,
}

impl ContainerLoader {
    /// Create a new container loader with the given configuration.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use armature::{ContainerLoader, config::LoaderConfig};
    ///
    /// let config = LoaderConfig::default();
    /// let loader = ContainerLoader::new(config);
    /// ```
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Returns the loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a container document and everything it imports.
    ///
    /// Relative paths are resolved against the working directory.
    ///
    /// # Errors
    ///
    /// Returns `ArmatureError` when the path cannot be resolved, the
    /// configuration is inconsistent or the load fails.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use armature::ContainerLoader;
    ///
    /// let loaded = ContainerLoader::default()
    ///     .load("config/services.xml")
    ///     .expect("Failed to load container");
    /// println!("{} services", loaded.container().registry().len());
    /// ```
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadedContainer, ArmatureError> {
        let path = std::path::absolute(path.as_ref())?;
        info!(path:? = path; "Loading container");

        let mut container = self.container()?;
        let report = self
            .loader()
            .load(&path.to_string_lossy(), &mut container)
            .map_err(|err| {
                let src = read_primary_source(&err);
                ArmatureError::new_load_error(err, src)
            })?;

        Ok(self.finish(container, report))
    }

    /// Load a container document held in memory.
    ///
    /// `path` names the document; imports are resolved relative to it.
    ///
    /// # Errors
    ///
    /// Returns `ArmatureError` when the configuration is inconsistent or
    /// the load fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use armature::ContainerLoader;
    ///
    /// let source = r#"<container xmlns="http://armature.dev/schema/dic/services">
    ///     <services><service id="app" class="App\Kernel"/></services>
    /// </container>"#;
    ///
    /// let loaded = ContainerLoader::default()
    ///     .load_source(source, "services.xml")
    ///     .expect("Failed to load container");
    /// assert!(loaded.container().registry().contains("app"));
    /// ```
    pub fn load_source(
        &self,
        source: &str,
        path: impl Into<PathBuf>,
    ) -> Result<LoadedContainer, ArmatureError> {
        let path = path.into();
        info!(path:? = path; "Loading container from source");

        let mut container = self.container()?;
        let report = self
            .loader()
            .load_source(source, &path, &mut container)
            .map_err(|err| {
                let src = match err.primary().and_then(Diagnostic::file) {
                    Some(file) if file == path => Some(source.to_string()),
                    _ => read_primary_source(&err),
                };
                ArmatureError::new_load_error(err, src)
            })?;

        Ok(self.finish(container, report))
    }

    fn loader(&self) -> XmlFileLoader {
        XmlFileLoader::new(FileLocator::new(self.config.search_paths().to_vec()))
            .with_options(self.config.loader_options())
    }

    /// An empty container with the configured extensions registered.
    fn container(&self) -> Result<ContainerBuilder, ArmatureError> {
        let mut container = ContainerBuilder::new();

        for extension in self.config.extensions() {
            if extension.namespace().is_empty() || extension.alias().is_empty() {
                return Err(ArmatureError::Config(
                    "extensions need a non-empty namespace and alias".to_string(),
                ));
            }
            if container.has_extension(extension.namespace())
                || container.has_extension(extension.alias())
            {
                return Err(ArmatureError::Config(format!(
                    "extension \"{}\" ({}) is declared more than once",
                    extension.alias(),
                    extension.namespace()
                )));
            }

            debug!(namespace = extension.namespace(), alias = extension.alias(); "Registering extension");
            container.register_extension(extension.to_extension());
        }

        Ok(container)
    }

    fn finish(&self, container: ContainerBuilder, report: LoadReport) -> LoadedContainer {
        info!(
            services = container.registry().len(),
            parameters = container.parameters().len(),
            resources = container.resources().len(),
            warnings = report.warnings().len();
            "Container loaded"
        );
        trace!(registry:? = container.registry(); "Loaded registry");

        LoadedContainer { container, report }
    }
}

/// A successfully loaded container.
#[derive(Debug)]
pub struct LoadedContainer {
    container: ContainerBuilder,
    report: LoadReport,
}

impl LoadedContainer {
    /// Returns the loaded container.
    pub fn container(&self) -> &ContainerBuilder {
        &self.container
    }

    /// Returns the warnings reported while loading.
    pub fn warnings(&self) -> &[Diagnostic] {
        self.report.warnings()
    }

    /// Consumes the result, returning the container.
    pub fn into_container(self) -> ContainerBuilder {
        self.container
    }
}

fn read_primary_source(err: &LoadError) -> Option<String> {
    let file = err.primary().and_then(Diagnostic::file)?;
    fs::read_to_string(file).ok()
}
