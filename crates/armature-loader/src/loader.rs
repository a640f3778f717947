//! Document-level orchestration.
//!
//! [`XmlFileLoader`] reads a container document and everything it imports
//! into a [`ContainerBuilder`]. One document is processed in this order:
//!
//! 1. schema and extension validation
//! 2. resource tracking
//! 3. defaults
//! 4. anonymous services
//! 5. imports
//! 6. parameters
//! 7. extension configuration
//! 8. named services

use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::{debug, info, warn};

use armature_core::{config_value::ConfigValue, scalar::Scalar};

use crate::{
    anonymous::AnonymousServices,
    arguments::ArgumentResolver,
    container::ContainerBuilder,
    defaults::Defaults,
    definition::DefinitionResolver,
    document::{Document, Element},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, LoadError, Result},
    extension::convert_element,
    locator::ResourceLocator,
    schema::{self, SchemaValidator, StructuralValidator},
};

/// Default bound on inline service nesting.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

/// Tunables of a load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderOptions {
    constants: IndexMap<String, Scalar>,
    max_nesting_depth: usize,
    validate_schema: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            constants: IndexMap::new(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            validate_schema: true,
        }
    }
}

impl LoaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a constant for `type="constant"` arguments.
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

    pub fn constants(&self) -> &IndexMap<String, Scalar> {
        &self.constants
    }

    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }

    pub fn validate_schema(&self) -> bool {
        self.validate_schema
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    warnings: Vec<Diagnostic>,
}

impl LoadReport {
    fn new(warnings: Vec<Diagnostic>) -> Self {
        Self { warnings }
    }

    /// Deprecations reported while loading.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A loader of container resources.
pub trait Loader {
    /// Returns `true` if this loader handles `resource`.
    ///
    /// `kind` is an explicit resource type; without one the name decides.
    fn supports(&self, resource: &str, kind: Option<&str>) -> bool;

    /// Load `resource` and everything it imports into `container`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] whose first diagnostic is the fatal one. The
    /// container is left partially filled and should be discarded.
    fn load(
        &self,
        resource: &str,
        container: &mut ContainerBuilder,
    ) -> std::result::Result<LoadReport, LoadError>;
}

/// Loads XML container documents.
#[derive(Debug)]
pub struct XmlFileLoader {
    locator: Box<dyn ResourceLocator>,
    validator: Box<dyn SchemaValidator>,
    options: LoaderOptions,
}

impl XmlFileLoader {
    /// Create a loader that validates with the [`StructuralValidator`].
    pub fn new(locator: impl ResourceLocator + 'static) -> Self {
        Self {
            locator: Box::new(locator),
            validator: Box::new(StructuralValidator),
            options: LoaderOptions::default(),
        }
    }

    pub fn with_validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Load a document held in memory.
    ///
    /// `path` identifies the document: it is tracked as a resource, seeds
    /// anonymous identifiers and anchors relative imports.
    pub fn load_source(
        &self,
        source: &str,
        path: impl Into<PathBuf>,
        container: &mut ContainerBuilder,
    ) -> std::result::Result<LoadReport, LoadError> {
        let mut session = LoadSession::new(self);
        let outcome = Document::parse(source, path).and_then(|document| {
            session.stack.push(document.path().to_path_buf());
            session.process(&document, container)
        });
        session.finish(outcome)
    }
}

impl Loader for XmlFileLoader {
    fn supports(&self, resource: &str, kind: Option<&str>) -> bool {
        match kind {
            Some(kind) => kind == "xml",
            None => Path::new(resource)
                .extension()
                .is_some_and(|extension| extension == "xml"),
        }
    }

    fn load(
        &self,
        resource: &str,
        container: &mut ContainerBuilder,
    ) -> std::result::Result<LoadReport, LoadError> {
        info!(resource; "Loading container");

        let mut session = LoadSession::new(self);
        let outcome = session.import(resource, None, container);
        session.finish(outcome)
    }
}

/// State of one top-level load: the import chain and collected warnings.
struct LoadSession<'l> {
    loader: &'l XmlFileLoader,
    stack: Vec<PathBuf>,
    diagnostics: DiagnosticCollector,
}

impl<'l> LoadSession<'l> {
    fn new(loader: &'l XmlFileLoader) -> Self {
        Self {
            loader,
            stack: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn finish(self, outcome: Result<()>) -> std::result::Result<LoadReport, LoadError> {
        match outcome {
            Ok(()) => self.diagnostics.finish().map(LoadReport::new),
            Err(fatal) => Err(self.diagnostics.fail(fatal)),
        }
    }

    /// Locate, read and process one resource.
    fn import(
        &mut self,
        resource: &str,
        current_dir: Option<&Path>,
        container: &mut ContainerBuilder,
    ) -> Result<()> {
        if !self.loader.supports(resource, None) {
            return Err(Diagnostic::error(format!(
                "cannot load resource \"{resource}\": only XML documents are supported"
            ))
            .with_code(ErrorCode::E006));
        }

        let path = self.loader.locator.locate(resource, current_dir)?;

        if let Some(start) = self.stack.iter().position(|loading| *loading == path) {
            let chain = self.stack[start..]
                .iter()
                .chain([&path])
                .map(|path| format!("\"{}\"", path.display()))
                .collect::<Vec<_>>()
                .join(" > ");
            return Err(Diagnostic::error(format!(
                "circular reference detected in \"{resource}\" ({chain})"
            ))
            .with_code(ErrorCode::E005));
        }

        let source = fs::read_to_string(&path).map_err(|err| {
            Diagnostic::error(format!("unable to read \"{}\": {err}", path.display()))
                .with_code(ErrorCode::E004)
                .with_file(&path)
        })?;
        let document = Document::parse(source, &path)?;

        self.stack.push(path);
        let outcome = self.process(&document, container);
        self.stack.pop();
        outcome
    }

    fn process(&mut self, document: &Document, container: &mut ContainerBuilder) -> Result<()> {
        let loader = self.loader;
        let path = document.path();
        let root = document.root();

        if loader.options.validate_schema {
            schema::validate(document, container, loader.validator.as_ref())?;
        }
        validate_extensions(document, container)?;

        container.track_resource(path);

        let defaults = Defaults::resolve(root, path)?;
        let anonymous = AnonymousServices::discover(root, path, &mut self.diagnostics);
        let arguments = ArgumentResolver::new(path, anonymous.ids(), &loader.options.constants);
        let definitions =
            DefinitionResolver::new(path, arguments, loader.options.max_nesting_depth);

        anonymous.register(
            &definitions,
            &defaults,
            container.registry_mut(),
            &mut self.diagnostics,
        )?;

        self.imports(document, container)?;

        if let Some(parameters) = root.first_services_child("parameters") {
            let resolved = arguments.resolve(parameters, "parameter", true)?;
            debug!(file:? = path, count = resolved.len(); "Merged parameters");
            container.parameters_mut().add(resolved);
        }

        for element in extension_elements(root) {
            let config = match convert_element(element) {
                Some(config @ ConfigValue::Map(_)) => config,
                _ => ConfigValue::empty_map(),
            };
            container.load_from_extension(element.namespace().unwrap_or_default(), config);
        }

        let mut named = 0;
        for service in root
            .services_children("services")
            .flat_map(|services| services.services_children("service"))
        {
            // Services without an id were registered as anonymous ones.
            let Some(id) = service.attribute("id") else {
                continue;
            };
            if id.is_empty() {
                return Err(Diagnostic::error(format!(
                    "service declared with an empty \"id\" attribute in \"{}\"",
                    path.display()
                ))
                .with_code(ErrorCode::E104)
                .with_file(path)
                .with_label(service.span(), "empty identifier"));
            }

            if let Some(entry) = definitions.resolve(
                service,
                id,
                &defaults,
                container.registry_mut(),
                &mut self.diagnostics,
            )? {
                container.registry_mut().set_definition(id, entry);
            }
            named += 1;
        }

        info!(
            file:? = path,
            services = named,
            anonymous = anonymous.len();
            "Loaded container document"
        );

        Ok(())
    }

    fn imports(&mut self, document: &Document, container: &mut ContainerBuilder) -> Result<()> {
        let imports = document
            .root()
            .services_children("imports")
            .flat_map(|imports| imports.services_children("import"));

        for import in imports {
            let resource = import.attribute("resource").unwrap_or_default();
            let ignore_errors =
                Scalar::phpize(import.attribute("ignore-errors").unwrap_or_default()).as_bool();

            info!(file:? = document.path(), resource, ignore_errors; "Importing resource");

            match self.import(resource, document.directory(), container) {
                Ok(()) => {}
                Err(err) if ignore_errors && err.code() != Some(ErrorCode::E005) => {
                    warn!(resource, error:% = err; "Ignoring failed import");
                }
                Err(err) if err.file().is_none() => {
                    return Err(err
                        .with_file(document.path())
                        .with_label(import.span(), "imported here"));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

/// Top-level elements outside the services namespace.
fn extension_elements(root: &Element) -> impl Iterator<Item = &Element> {
    root.child_elements()
        .filter(|element| !element.is_services_namespace())
}

/// Every extension element must be claimed by a registered extension.
fn validate_extensions(document: &Document, container: &ContainerBuilder) -> Result<()> {
    for element in extension_elements(document.root()) {
        let namespace = element.namespace().unwrap_or_default();
        if container.has_extension(namespace) {
            continue;
        }

        let known: Vec<String> = container
            .extensions()
            .iter()
            .map(|extension| format!("\"{}\"", extension.namespace()))
            .collect();
        let known = if known.is_empty() {
            "none".to_string()
        } else {
            known.join(", ")
        };

        return Err(Diagnostic::error(format!(
            "there is no extension able to load the configuration for \"{}\" (in \"{}\"); looked for namespace \"{namespace}\", found {known}",
            element.name(),
            document.path().display()
        ))
        .with_code(ErrorCode::E200)
        .with_file(document.path())
        .with_label(element.span(), "unclaimed configuration")
        .with_help("register an extension for this namespace"));
    }

    Ok(())
}
