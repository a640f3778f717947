//! Extensions claiming foreign-namespace configuration.
//!
//! Any top-level element of a container document outside the services
//! namespace belongs to an extension. The element is converted into a
//! nested [`ConfigValue`] with [`convert_element`] and handed to the
//! [`ContainerBuilder`](crate::ContainerBuilder), which records it under the
//! extension's alias.

use std::{fmt, path::PathBuf};

use indexmap::IndexMap;

use armature_core::{config_value::ConfigValue, scalar::Scalar};

use crate::document::{Element, Node};

/// Where an extension's schema comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Directory the extension namespace maps onto.
    ///
    /// A location from `xsi:schemaLocation` is rewritten by replacing the
    /// namespace prefix with this directory.
    Directory(PathBuf),
    /// Schema held in memory, written to a temporary file for validation.
    Embedded { name: String, contents: String },
}

/// A handler for one configuration namespace.
pub trait Extension: fmt::Debug {
    /// Namespace URI of the elements this extension accepts.
    fn namespace(&self) -> &str;

    /// Short name the received configuration is recorded under.
    fn alias(&self) -> &str;

    /// Schema used to validate this extension's elements, if any.
    fn schema(&self) -> Option<SchemaSource> {
        None
    }
}

/// An extension that accepts configuration without interpreting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredExtension {
    namespace: String,
    alias: String,
    schema: Option<SchemaSource>,
}

impl DeclaredExtension {
    pub fn new(namespace: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            alias: alias.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: SchemaSource) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl Extension for DeclaredExtension {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn alias(&self) -> &str {
        &self.alias
    }

    fn schema(&self) -> Option<SchemaSource> {
        self.schema.clone()
    }
}

/// Convert an extension element into a nested configuration value.
///
/// - attributes without namespace, or in the element's namespace, become keys;
/// - child elements in the element's namespace become keys, and repeated
///   names collapse into a list;
/// - non-blank text is stored under `"value"` next to other keys, or is the
///   whole value when there are none.
///
/// Returns `None` for an element with no attributes, children or text.
pub fn convert_element(element: &Element) -> Option<ConfigValue> {
    let namespace = element.namespace();
    let mut config: IndexMap<String, ConfigValue> = IndexMap::new();
    let mut empty = true;

    for attribute in element.attributes() {
        if attribute.namespace().is_some() && attribute.namespace() != namespace {
            continue;
        }
        config.insert(
            attribute.name().to_string(),
            ConfigValue::Scalar(Scalar::phpize(attribute.value())),
        );
        empty = false;
    }

    let mut text = None;
    for node in element.children() {
        match node {
            Node::Text(value) => {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    text = Some(trimmed.to_string());
                    empty = false;
                }
            }
            Node::Element(child) if child.namespace() == namespace => {
                let value = convert_element(child).unwrap_or(ConfigValue::Scalar(Scalar::Null));
                insert_child(&mut config, child.name(), value);
                empty = false;
            }
            Node::Element(_) => {}
        }
    }

    if empty {
        return None;
    }

    match text {
        Some(text) if config.is_empty() => Some(ConfigValue::Scalar(Scalar::phpize(&text))),
        Some(text) => {
            config.insert("value".to_string(), ConfigValue::Scalar(Scalar::phpize(&text)));
            Some(ConfigValue::Map(config))
        }
        None => Some(ConfigValue::Map(config)),
    }
}

fn insert_child(config: &mut IndexMap<String, ConfigValue>, key: &str, value: ConfigValue) {
    match config.get_mut(key) {
        None | Some(ConfigValue::Scalar(Scalar::Null)) => {
            config.insert(key.to_string(), value);
        }
        Some(ConfigValue::List(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, ConfigValue::List(Vec::new()));
            *existing = ConfigValue::List(vec![first, value]);
        }
    }
}
