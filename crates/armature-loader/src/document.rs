//! Read-only document tree with namespace-aware element access.
//!
//! A container document is parsed once into an owned tree of [`Element`]s.
//! Every element carries a [`NodeId`] assigned in document order and the
//! [`Span`] it occupies in the source text. The tree is never mutated while
//! it is being resolved; side tables keyed by [`NodeId`] take the place of
//! in-place edits.

use std::path::{Path, PathBuf};

use log::trace;

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
};

/// Namespace of the service container vocabulary.
pub const SERVICES_NAMESPACE: &str = "http://armature.dev/schema/dic/services";

/// Namespace of the `xsi:schemaLocation` attribute.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Stable identity of an element within one document, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// An attribute with its optional namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    namespace: Option<String>,
    name: String,
    value: String,
}

impl Attribute {
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local name of the attribute.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A child node: either an element or a run of text.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element of the document tree.
#[derive(Debug, Clone)]
pub struct Element {
    id: NodeId,
    namespace: Option<String>,
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
    span: Span,
}

impl Element {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns `true` if the element has this namespace and local name.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.name == name
    }

    /// Returns `true` if the element belongs to the services namespace.
    pub fn is_services_namespace(&self) -> bool {
        self.namespace.as_deref() == Some(SERVICES_NAMESPACE)
    }

    /// All attributes, namespaced ones included, in document order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Value of an attribute without namespace.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.is_none() && attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Value of an attribute without namespace, treating empty values as absent.
    pub fn non_empty_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).filter(|value| !value.is_empty())
    }

    /// Value of a namespaced attribute.
    pub fn namespaced_attribute(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.as_deref() == Some(namespace) && attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Direct child nodes in document order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct child elements in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Direct child elements matching a namespace and local name.
    ///
    /// Elements with the same local name in another namespace are skipped.
    pub fn children_of<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.child_elements()
            .filter(move |child| child.is(namespace, name))
    }

    /// Direct child elements of the services namespace with this local name.
    pub fn services_children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children_of(SERVICES_NAMESPACE, name)
    }

    /// First services-namespace child with this local name.
    pub fn first_services_child<'a>(&'a self, name: &'a str) -> Option<&'a Element> {
        self.services_children(name).next()
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, buffer: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => buffer.push_str(text),
                Node::Element(element) => element.collect_text(buffer),
            }
        }
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(&mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, found: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            found.push(child);
            child.collect_descendants(found);
        }
    }
}

/// A parsed container document.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    source: String,
    root: Element,
}

impl Document {
    /// Parse XML source into a document tree.
    ///
    /// `path` is recorded for diagnostics and anonymous identifiers only.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorCode::E001`] diagnostic when the source is not
    /// well-formed.
    pub fn parse(source: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let path = path.into();

        let root = {
            let xml = roxmltree::Document::parse(&source).map_err(|err| {
                let offset = xml_error_offset(&source, err.pos());
                Diagnostic::error(format!("unable to parse file \"{}\": {err}", path.display()))
                    .with_code(ErrorCode::E001)
                    .with_file(&path)
                    .with_label(Span::new(offset..offset), "document is not well-formed")
            })?;

            let mut next_id = 0;
            build_element(xml.root_element(), &mut next_id)
        };

        trace!(path:? = path; "Parsed document");
        Ok(Self { path, source, root })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Directory containing the document, used to resolve relative imports.
    pub fn directory(&self) -> Option<&Path> {
        self.path.parent()
    }
}

fn build_element(node: roxmltree::Node<'_, '_>, next_id: &mut usize) -> Element {
    let id = NodeId(*next_id);
    *next_id += 1;

    let attributes = node
        .attributes()
        .map(|attr| Attribute {
            namespace: attr.namespace().map(str::to_string),
            name: attr.name().to_string(),
            value: attr.value().to_string(),
        })
        .collect();

    let children = node
        .children()
        .filter_map(|child| {
            if child.is_element() {
                Some(Node::Element(build_element(child, next_id)))
            } else if child.is_text() {
                child.text().map(|text| Node::Text(text.to_string()))
            } else {
                None
            }
        })
        .collect();

    Element {
        id,
        namespace: node.tag_name().namespace().map(str::to_string),
        name: node.tag_name().name().to_string(),
        attributes,
        children,
        span: Span::new(node.range()),
    }
}

/// Convert a 1-based row/column position into a byte offset.
fn xml_error_offset(source: &str, pos: roxmltree::TextPos) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take((pos.row as usize).saturating_sub(1))
        .map(str::len)
        .sum();
    let column: usize = source[line_start.min(source.len())..]
        .chars()
        .take((pos.col as usize).saturating_sub(1))
        .map(char::len_utf8)
        .sum();
    (line_start + column).min(source.len())
}
