//! Resolution of `<argument>`, `<property>` and `<parameter>` elements.
//!
//! Sibling elements are turned into an [`Arguments`] mapping. Each element
//! gets a key, then a value chosen by its `type` attribute.

use std::path::Path;

use indexmap::IndexMap;

use armature_core::{
    argument::{ArgumentKey, ArgumentValue, Arguments, InvalidBehavior, Reference},
    scalar::Scalar,
};

use crate::{
    anonymous::AnonymousIds,
    document::Element,
    error::{Diagnostic, ErrorCode, Result},
};

/// Resolves argument-like child elements of one document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ArgumentResolver<'a> {
    file: &'a Path,
    anonymous_ids: &'a AnonymousIds,
    constants: &'a IndexMap<String, Scalar>,
}

impl<'a> ArgumentResolver<'a> {
    pub fn new(
        file: &'a Path,
        anonymous_ids: &'a AnonymousIds,
        constants: &'a IndexMap<String, Scalar>,
    ) -> Self {
        Self {
            file,
            anonymous_ids,
            constants,
        }
    }

    /// Resolve every `name` child of `parent` in document order.
    ///
    /// `lowercase` only has an effect when `name` is `"parameter"`.
    pub fn resolve(&self, parent: &Element, name: &str, lowercase: bool) -> Result<Arguments> {
        let lowercase = lowercase && name == "parameter";
        let mut arguments = Arguments::new();

        for element in parent.services_children(name) {
            let key = argument_key(element, lowercase, &arguments);
            let value = self.argument_value(element, name)?;
            arguments.insert(key, value);
        }

        Ok(arguments)
    }

    fn argument_value(&self, element: &Element, name: &str) -> Result<ArgumentValue> {
        let value = match element.attribute("type").unwrap_or_default() {
            "service" => {
                let id = self.service_id(element)?;
                ArgumentValue::Reference(Reference::new(id, invalid_behavior(element)))
            }
            "expression" => ArgumentValue::Expression(element.text()),
            "closure-proxy" => {
                let id = self.service_id(element)?;
                let Some(method) = element.non_empty_attribute("method") else {
                    return Err(self
                        .invalid_attribute(
                            element,
                            "tag \"<{name}>\" with type=\"closure-proxy\" has no or empty \"method\" attribute",
                        )
                        .with_label(element.span(), "missing method name"));
                };
                ArgumentValue::ClosureProxy {
                    reference: Reference::new(id, invalid_behavior(element)),
                    method: method.to_string(),
                }
            }
            "collection" => ArgumentValue::Collection(self.resolve(element, name, false)?),
            "iterator" => ArgumentValue::Iterator(self.resolve(element, name, false)?),
            "string" => ArgumentValue::String(element.text()),
            "constant" => self.constant(element)?,
            _ => ArgumentValue::Scalar(Scalar::phpize(&element.text())),
        };

        Ok(value)
    }

    /// Identifier of a referenced service, either explicit or assigned to an
    /// inline declaration.
    fn service_id(&self, element: &Element) -> Result<String> {
        let id = match element.attribute("id") {
            Some(id) => Some(id),
            None => self.anonymous_ids.get(&element.id()).map(String::as_str),
        };

        match id {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(self
                .invalid_attribute(
                    element,
                    "tag \"<{name}>\" with type=\"{type}\" has no or empty \"id\" attribute",
                )
                .with_label(element.span(), "missing service identifier")),
        }
    }

    fn constant(&self, element: &Element) -> Result<ArgumentValue> {
        let text = element.text();
        let name = text.trim();

        match self.constants.get(name) {
            Some(value) => Ok(ArgumentValue::Constant {
                name: name.to_string(),
                value: value.clone(),
            }),
            None => Err(Diagnostic::error(format!(
                "undefined constant \"{name}\" in \"{}\"",
                self.file.display()
            ))
            .with_code(ErrorCode::E102)
            .with_file(self.file)
            .with_label(element.span(), "constant referenced here")
            .with_help("declare the constant in the loader configuration")),
        }
    }

    fn invalid_attribute(&self, element: &Element, template: &str) -> Diagnostic {
        let message = template
            .replace("{name}", element.name())
            .replace("{type}", element.attribute("type").unwrap_or_default());

        Diagnostic::error(format!("{message} in \"{}\"", self.file.display()))
            .with_code(ErrorCode::E104)
            .with_file(self.file)
    }
}

/// Key an element is stored under.
///
/// `name` wins over `index`, which wins over `key`. Elements with none of
/// them take the next free position.
fn argument_key(element: &Element, lowercase: bool, arguments: &Arguments) -> ArgumentKey {
    let keyed = |key: &str| {
        if lowercase {
            ArgumentKey::from_key(&key.to_lowercase())
        } else {
            ArgumentKey::from_key(key)
        }
    };

    if let Some(name) = element.attribute("name") {
        return keyed(name);
    }
    if let Some(index) = element.attribute("index") {
        return ArgumentKey::Name(format!("index_{index}"));
    }
    match element.attribute("key") {
        Some(key) => keyed(key),
        None => ArgumentKey::Position(arguments.next_position()),
    }
}

fn invalid_behavior(element: &Element) -> InvalidBehavior {
    InvalidBehavior::from_attribute(element.attribute("on-invalid").unwrap_or_default())
}
