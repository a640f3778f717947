//! Container-wide service defaults.

use std::path::Path;

use armature_core::{blueprint::CONSTRUCTOR, scalar::Scalar};

use crate::{
    document::Element,
    error::{Diagnostic, ErrorCode, Result},
};

/// Defaults declared by the first `<services><defaults>` element.
#[derive(Debug, Clone, Default)]
pub(crate) struct Defaults<'d> {
    public: Option<bool>,
    tags: Vec<&'d Element>,
    autowired_methods: Vec<String>,
}

impl<'d> Defaults<'d> {
    /// Defaults that apply nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read the defaults of a document.
    ///
    /// Only the first `defaults` element across all `services` blocks counts.
    pub fn resolve(root: &'d Element, file: &Path) -> Result<Self> {
        let Some(node) = root
            .services_children("services")
            .flat_map(|services| services.services_children("defaults"))
            .next()
        else {
            return Ok(Self::empty());
        };

        let tags: Vec<&Element> = node.services_children("tag").collect();
        if let Some(tag) = tags.iter().find(|tag| tag.attribute("name").unwrap_or_default().is_empty()) {
            return Err(Diagnostic::error(format!(
                "the tag name for tag \"<defaults>\" in \"{}\" must be a non-empty string",
                file.display()
            ))
            .with_code(ErrorCode::E101)
            .with_file(file)
            .with_label(tag.span(), "tag without a name"));
        }

        let public = node
            .attribute("public")
            .map(|value| Scalar::phpize(value).as_bool());

        let autowire_tags: Vec<&Element> = node.services_children("autowire").collect();
        let autowired_methods = match node.attribute("autowire") {
            None => autowire_tags.iter().map(|tag| tag.text()).collect(),
            Some(_) if !autowire_tags.is_empty() => {
                return Err(Diagnostic::error(format!(
                    "the \"autowire\" attribute cannot be used together with \"<autowire>\" tags for tag \"<defaults>\" in \"{}\"",
                    file.display()
                ))
                .with_code(ErrorCode::E100)
                .with_file(file)
                .with_label(node.span(), "conflicting autowire declaration")
                .with_secondary_label(autowire_tags[0].span(), "<autowire> tag declared here")
                .with_help("remove either the attribute or the <autowire> tags"));
            }
            Some(value) if Scalar::phpize(value).as_bool() => vec![CONSTRUCTOR.to_string()],
            Some(_) => Vec::new(),
        };

        Ok(Self {
            public,
            tags,
            autowired_methods,
        })
    }

    /// Default visibility, when declared.
    pub fn public(&self) -> Option<bool> {
        self.public
    }

    /// Tag elements applied to services without their own tags.
    pub fn tags(&self) -> &[&'d Element] {
        &self.tags
    }

    pub fn autowired_methods(&self) -> &[String] {
        &self.autowired_methods
    }
}
