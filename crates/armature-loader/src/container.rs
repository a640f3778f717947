//! The container under construction.
//!
//! [`ContainerBuilder`] is the sink a load writes into: the service
//! registry, the parameter bag, the files that were read and the
//! configuration handed to each extension.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;

use armature_core::{config_value::ConfigValue, parameter::ParameterBag, registry::Registry};

use crate::extension::Extension;

/// Everything produced by loading container documents.
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    registry: Registry,
    parameters: ParameterBag,
    resources: Vec<PathBuf>,
    extensions: Vec<Box<dyn Extension>>,
    extension_configs: IndexMap<String, Vec<ConfigValue>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn parameters(&self) -> &ParameterBag {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterBag {
        &mut self.parameters
    }

    /// Record a file the container was built from; repeated paths are kept once.
    pub fn track_resource(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.resources.contains(&path) {
            self.resources.push(path);
        }
    }

    /// Files read so far, in load order.
    pub fn resources(&self) -> &[PathBuf] {
        &self.resources
    }

    /// Returns `true` if `path` has been recorded.
    pub fn is_tracked(&self, path: &Path) -> bool {
        self.resources.iter().any(|resource| resource == path)
    }

    pub fn register_extension(&mut self, extension: impl Extension + 'static) {
        self.extensions.push(Box::new(extension));
    }

    /// Returns `true` if an extension answers to this namespace or alias.
    pub fn has_extension(&self, name: &str) -> bool {
        self.extension(name).is_some()
    }

    /// Get an extension by namespace or alias.
    pub fn extension(&self, name: &str) -> Option<&dyn Extension> {
        self.extensions
            .iter()
            .find(|extension| extension.namespace() == name || extension.alias() == name)
            .map(Box::as_ref)
    }

    /// Registered extensions, in registration order.
    pub fn extensions(&self) -> &[Box<dyn Extension>] {
        &self.extensions
    }

    /// Record configuration for the extension known by `name`.
    ///
    /// Returns `false` if no extension answers to `name`.
    pub fn load_from_extension(&mut self, name: &str, config: ConfigValue) -> bool {
        let Some(alias) = self.extension(name).map(|extension| extension.alias().to_string()) else {
            return false;
        };

        debug!(extension = alias; "Recorded extension configuration");
        self.extension_configs.entry(alias).or_default().push(config);
        true
    }

    /// Configuration blocks recorded for an extension alias, in load order.
    pub fn extension_config(&self, alias: &str) -> &[ConfigValue] {
        self.extension_configs
            .get(alias)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All recorded configuration blocks keyed by extension alias.
    pub fn extension_configs(&self) -> &IndexMap<String, Vec<ConfigValue>> {
        &self.extension_configs
    }
}
