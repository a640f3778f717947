//! Schema validation of container documents.
//!
//! Before a document is resolved it is checked against a set of schemas:
//! the built-in services schema plus one schema per `xsi:schemaLocation`
//! namespace claimed by an extension that ships a schema. The check itself
//! is delegated to a [`SchemaValidator`].
//!
//! Embedded extension schemas are written to temporary files that live as
//! long as the assembled [`SchemaSet`], so they are removed on every path
//! out of validation.

use std::{
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
};

use log::debug;
use tempfile::NamedTempFile;

use crate::{
    container::ContainerBuilder,
    document::{Document, Element, SERVICES_NAMESPACE, XSI_NAMESPACE},
    error::{Diagnostic, ErrorCode, Result},
    extension::SchemaSource,
};

/// Accepted values of the `type` attribute on argument-like elements.
const ARGUMENT_TYPES: [&str; 7] = [
    "service",
    "expression",
    "collection",
    "iterator",
    "string",
    "constant",
    "closure-proxy",
];

/// Accepted values of the `on-invalid` attribute.
const INVALID_BEHAVIORS: [&str; 3] = ["ignore", "null", "exception"];

/// One schema a document is validated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLocation {
    namespace: String,
    path: Option<PathBuf>,
}

impl SchemaLocation {
    /// The built-in services schema.
    pub fn builtin() -> Self {
        Self {
            namespace: SERVICES_NAMESPACE.to_string(),
            path: None,
        }
    }

    pub fn new(namespace: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            namespace: namespace.into(),
            path: Some(path.into()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// File holding the schema, `None` for the built-in one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Validates a parsed document against a set of schemas.
pub trait SchemaValidator: fmt::Debug {
    /// Returns the validation messages when the document is invalid.
    fn validate(
        &self,
        document: &Document,
        schemas: &[SchemaLocation],
    ) -> std::result::Result<(), Vec<String>>;
}

/// Built-in validator for the services vocabulary.
///
/// Checks the structure of the services namespace and that every extension
/// schema is readable. Extension elements themselves are not inspected.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl SchemaValidator for StructuralValidator {
    fn validate(
        &self,
        document: &Document,
        schemas: &[SchemaLocation],
    ) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for schema in schemas {
            if let Some(path) = schema.path()
                && let Err(err) = fs::read_to_string(path)
            {
                errors.push(format!(
                    "unable to read schema \"{}\" for namespace \"{}\": {err}",
                    path.display(),
                    schema.namespace()
                ));
            }
        }

        let root = document.root();
        if !root.is(SERVICES_NAMESPACE, "container") {
            errors.push(format!(
                "root element <{}> is not a <container> in namespace \"{SERVICES_NAMESPACE}\"",
                root.name()
            ));
            return Err(errors);
        }

        for child in root.child_elements().filter(|child| child.is_services_namespace()) {
            match child.name() {
                "imports" => check_imports(child, &mut errors),
                "parameters" => {}
                "services" => check_services(child, &mut errors),
                other => errors.push(format!("element <{other}> is not allowed in <container>")),
            }
        }

        for element in root
            .descendants()
            .into_iter()
            .filter(|element| element.is_services_namespace())
        {
            check_attributes(element, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_imports(imports: &Element, errors: &mut Vec<String>) {
    for child in imports.child_elements() {
        if !child.is(SERVICES_NAMESPACE, "import") {
            errors.push(format!("element <{}> is not allowed in <imports>", child.name()));
        } else if !child.has_attribute("resource") {
            errors.push("element <import> requires a \"resource\" attribute".to_string());
        }
    }
}

fn check_services(services: &Element, errors: &mut Vec<String>) {
    for child in services.child_elements() {
        if !(child.is(SERVICES_NAMESPACE, "service") || child.is(SERVICES_NAMESPACE, "defaults")) {
            errors.push(format!("element <{}> is not allowed in <services>", child.name()));
        }
    }
}

fn check_attributes(element: &Element, errors: &mut Vec<String>) {
    if matches!(element.name(), "argument" | "property" | "parameter")
        && let Some(kind) = element.attribute("type")
        && !ARGUMENT_TYPES.contains(&kind)
    {
        errors.push(format!(
            "value \"{kind}\" of attribute \"type\" on <{}> is not one of {}",
            element.name(),
            ARGUMENT_TYPES.join(", ")
        ));
    }

    if let Some(behavior) = element.attribute("on-invalid")
        && !INVALID_BEHAVIORS.contains(&behavior)
    {
        errors.push(format!(
            "value \"{behavior}\" of attribute \"on-invalid\" on <{}> is not one of {}",
            element.name(),
            INVALID_BEHAVIORS.join(", ")
        ));
    }

    if element.name() == "tag" && !element.has_attribute("name") {
        errors.push("element <tag> requires a \"name\" attribute".to_string());
    }
}

/// Schemas assembled for one document.
///
/// Holds the temporary files of embedded schemas; they are deleted when
/// the set is dropped.
#[derive(Debug)]
pub(crate) struct SchemaSet {
    locations: Vec<SchemaLocation>,
    _temporary: Vec<NamedTempFile>,
}

impl SchemaSet {
    /// Collect the schemas `document` must be validated against.
    pub fn assemble(document: &Document, container: &ContainerBuilder) -> Result<Self> {
        let mut locations = vec![SchemaLocation::builtin()];
        let mut temporary = Vec::new();

        let declared = document
            .root()
            .namespaced_attribute(XSI_NAMESPACE, "schemaLocation")
            .unwrap_or_default();
        let items: Vec<&str> = declared.split_whitespace().collect();

        for pair in items.chunks(2) {
            let [namespace, location] = pair else {
                continue;
            };
            let Some(extension) = container.extension(namespace) else {
                continue;
            };
            let Some(source) = extension.schema() else {
                continue;
            };

            let path = match source {
                SchemaSource::Directory(base) => {
                    let path = match location.strip_prefix(extension.namespace()) {
                        Some(rest) => base.join(rest.trim_start_matches('/')),
                        None => PathBuf::from(location),
                    };
                    if !path.is_file() {
                        return Err(Diagnostic::error(format!(
                            "extension \"{}\" references a non-existent XSD file \"{}\"",
                            extension.alias(),
                            path.display()
                        ))
                        .with_code(ErrorCode::E003)
                        .with_file(document.path())
                        .with_label(document.root().span(), "schema location declared here"));
                    }
                    path
                }
                SchemaSource::Embedded { name, contents } => {
                    let file = materialize(&name, &contents).map_err(|err| {
                        Diagnostic::error(format!(
                            "unable to write embedded schema \"{name}\" of extension \"{}\": {err}",
                            extension.alias()
                        ))
                        .with_code(ErrorCode::E003)
                        .with_file(document.path())
                    })?;
                    let path = file.path().to_path_buf();
                    temporary.push(file);
                    path
                }
            };

            locations.retain(|existing| existing.namespace() != *namespace);
            locations.push(SchemaLocation::new(*namespace, path));
        }

        debug!(
            file:? = document.path(),
            schemas = locations.len(),
            temporary = temporary.len();
            "Assembled schema set"
        );

        Ok(Self {
            locations,
            _temporary: temporary,
        })
    }

    pub fn locations(&self) -> &[SchemaLocation] {
        &self.locations
    }
}

fn materialize(name: &str, contents: &str) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(name)
        .suffix(".xsd")
        .tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Validate `document` against the schemas it declares.
pub(crate) fn validate(
    document: &Document,
    container: &ContainerBuilder,
    validator: &dyn SchemaValidator,
) -> Result<()> {
    let schemas = SchemaSet::assemble(document, container)?;

    validator
        .validate(document, schemas.locations())
        .map_err(|messages| {
            Diagnostic::error(format!(
                "unable to parse file \"{}\": the document does not match its schema",
                document.path().display()
            ))
            .with_code(ErrorCode::E002)
            .with_file(document.path())
            .with_label(document.root().span(), "invalid document")
            .with_help(messages.join("\n"))
        })
}
