//! Resolution of a single `<service>` element into a registry entry.
//!
//! Aliases are registered directly and yield nothing. Every other
//! declaration becomes a [`Blueprint`], or a [`ChildBlueprint`] when it names
//! a parent. Children never receive container-wide defaults.

use std::path::Path;

use indexmap::IndexMap;
use log::{debug, trace};

use armature_core::{
    argument::{InvalidBehavior, Reference},
    blueprint::{
        Alias, Blueprint, Callable, CallableTarget, ChildBlueprint, Decoration, MethodCall,
        ServiceEntry, Tag,
    },
    registry::Registry,
    scalar::Scalar,
};

use crate::{
    arguments::ArgumentResolver,
    defaults::Defaults,
    document::Element,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
};

type AttributeSetter = fn(&mut Blueprint, &str);

/// Plain attributes copied onto the blueprint when present and truthy.
const ATTRIBUTE_SETTERS: [(&str, AttributeSetter); 5] = [
    ("class", |blueprint, value| blueprint.set_class(value)),
    ("shared", |blueprint, value| {
        blueprint.set_shared(Scalar::phpize(value).as_bool())
    }),
    ("synthetic", |blueprint, value| {
        blueprint.set_synthetic(Scalar::phpize(value).as_bool())
    }),
    ("lazy", |blueprint, value| {
        blueprint.set_lazy(Scalar::phpize(value).as_bool())
    }),
    ("abstract", |blueprint, value| {
        blueprint.set_abstract(Scalar::phpize(value).as_bool())
    }),
];

/// Attributes an alias declaration may carry.
const ALIAS_ATTRIBUTES: [&str; 3] = ["alias", "id", "public"];

/// Turns `<service>` elements of one document into registry entries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DefinitionResolver<'a> {
    file: &'a Path,
    arguments: ArgumentResolver<'a>,
    max_depth: usize,
}

impl<'a> DefinitionResolver<'a> {
    pub fn new(file: &'a Path, arguments: ArgumentResolver<'a>, max_depth: usize) -> Self {
        Self {
            file,
            arguments,
            max_depth,
        }
    }

    /// Resolve one service declaration.
    ///
    /// Returns `None` for aliases, which are written to `registry` here.
    pub fn resolve(
        &self,
        service: &Element,
        id: &str,
        defaults: &Defaults<'_>,
        registry: &mut Registry,
        diagnostics: &mut DiagnosticCollector,
    ) -> Result<Option<ServiceEntry>> {
        self.resolve_at_depth(service, id, defaults, registry, diagnostics, 0)
    }

    fn resolve_at_depth(
        &self,
        service: &Element,
        id: &str,
        defaults: &Defaults<'_>,
        registry: &mut Registry,
        diagnostics: &mut DiagnosticCollector,
        depth: usize,
    ) -> Result<Option<ServiceEntry>> {
        if let Some(target) = truthy_attribute(service, "alias") {
            self.resolve_alias(service, id, target, defaults, registry, diagnostics)?;
            return Ok(None);
        }

        let no_defaults = Defaults::empty();
        let parent = truthy_attribute(service, "parent");
        let defaults = if parent.is_some() { &no_defaults } else { defaults };

        let mut blueprint = Blueprint::new();

        if let Some(public) = truthy_attribute(service, "public") {
            blueprint.set_public(Scalar::phpize(public).as_bool());
        } else if let Some(public) = defaults.public() {
            blueprint.set_public(public);
        }

        for (attribute, setter) in ATTRIBUTE_SETTERS {
            if let Some(value) = truthy_attribute(service, attribute) {
                setter(&mut blueprint, value);
            }
        }

        if let Some(autowire) = truthy_attribute(service, "autowire") {
            blueprint.set_autowired(Scalar::phpize(autowire).as_bool());
        }

        if let Some(file) = service.first_services_child("file") {
            blueprint.set_file(file.text());
        }

        if let Some(deprecated) = service.first_services_child("deprecated") {
            let message = deprecated.text();
            blueprint.set_deprecated(true, (!message.is_empty()).then_some(message));
        }

        let arguments = self
            .arguments
            .resolve(service, "argument", false)
            .map_err(|err| self.locate(err, id))?;
        blueprint.set_arguments(arguments);

        let properties = self
            .arguments
            .resolve(service, "property", false)
            .map_err(|err| self.locate(err, id))?;
        blueprint.set_properties(properties);

        if let Some(factory) =
            self.callable(service, "factory", id, registry, diagnostics, depth)?
        {
            blueprint.set_factory(factory);
        }

        if let Some(configurator) =
            self.callable(service, "configurator", id, registry, diagnostics, depth)?
        {
            blueprint.set_configurator(configurator);
        }

        for call in service.services_children("call") {
            let arguments = self
                .arguments
                .resolve(call, "argument", false)
                .map_err(|err| self.locate(err, id))?;
            blueprint.add_method_call(MethodCall::new(
                call.attribute("method").unwrap_or_default(),
                arguments,
            ));
        }

        for tag in self.tags(service, id, defaults)? {
            blueprint.add_tag(tag);
        }

        for autowiring_type in service.services_children("autowiring-type") {
            blueprint.add_autowiring_type(autowiring_type.text());
        }

        let autowire_tags: Vec<&Element> = service.services_children("autowire").collect();
        if let Some(first_tag) = autowire_tags.first() {
            if service.has_attribute("autowire") {
                return Err(self.locate(
                    Diagnostic::error(format!(
                        "the \"autowire\" attribute cannot be used together with \"<autowire>\" tags for service \"{id}\" in \"{}\"",
                        self.file.display()
                    ))
                    .with_code(ErrorCode::E100)
                    .with_label(service.span(), "conflicting autowire declaration")
                    .with_secondary_label(first_tag.span(), "<autowire> tag declared here")
                    .with_help("remove either the attribute or the <autowire> tags"),
                    id,
                ));
            }
            blueprint.set_autowired_methods(autowire_tags.iter().map(|tag| tag.text()).collect());
        } else if !service.has_attribute("autowire") && !defaults.autowired_methods().is_empty() {
            blueprint.set_autowired_methods(defaults.autowired_methods().to_vec());
        }

        if let Some(decorated) = truthy_attribute(service, "decorates") {
            let inner_name = service
                .attribute("decoration-inner-name")
                .map(str::to_string);
            let priority = match service.attribute("decoration-priority") {
                None => 0,
                Some(raw) => match Scalar::phpize(raw) {
                    Scalar::Int(priority) => priority,
                    _ => {
                        return Err(self.locate(
                            Diagnostic::error(format!(
                                "invalid decoration priority \"{raw}\" for service \"{id}\" in \"{}\"",
                                self.file.display()
                            ))
                            .with_code(ErrorCode::E104)
                            .with_label(service.span(), "expected an integer priority"),
                            id,
                        ));
                    }
                },
            };
            blueprint.set_decoration(Decoration::new(decorated, inner_name, priority));
        }

        blueprint.set_source(self.file);

        let entry = match parent {
            Some(parent) => ServiceEntry::from(ChildBlueprint::from_blueprint(parent, blueprint)),
            None => ServiceEntry::from(blueprint),
        };

        debug!(id, kind = entry.kind(), depth; "Resolved service");
        trace!(entry:?; "Resolved service entry");

        Ok(Some(entry))
    }

    fn resolve_alias(
        &self,
        service: &Element,
        id: &str,
        target: &str,
        defaults: &Defaults<'_>,
        registry: &mut Registry,
        diagnostics: &mut DiagnosticCollector,
    ) -> Result<()> {
        if id.is_empty() {
            return Err(Diagnostic::error(format!(
                "alias to \"{target}\" has no identifier in \"{}\"",
                self.file.display()
            ))
            .with_code(ErrorCode::E104)
            .with_file(self.file)
            .with_label(service.span(), "alias declared here"));
        }

        self.validate_alias(service, id, diagnostics);

        let public = match truthy_attribute(service, "public") {
            Some(public) => Scalar::phpize(public).as_bool(),
            None => defaults.public().unwrap_or(true),
        };

        registry.set_alias(id, Alias::new(target, public));
        debug!(id, target, public; "Registered alias");

        Ok(())
    }

    fn validate_alias(&self, service: &Element, id: &str, diagnostics: &mut DiagnosticCollector) {
        for attribute in service.attributes() {
            if ALIAS_ATTRIBUTES.contains(&attribute.name()) {
                continue;
            }
            diagnostics.emit(
                self.locate(
                    Diagnostic::warning(format!(
                        "using the attribute \"{}\" is deprecated for alias definition \"{id}\" in \"{}\"",
                        attribute.name(),
                        self.file.display()
                    ))
                    .with_code(ErrorCode::E300)
                    .with_label(service.span(), "attribute is ignored")
                    .with_help("aliases only accept the \"alias\", \"id\" and \"public\" attributes"),
                    id,
                ),
            );
        }

        for child in service
            .child_elements()
            .filter(|child| child.is_services_namespace())
        {
            diagnostics.emit(
                self.locate(
                    Diagnostic::warning(format!(
                        "using the element \"{}\" is deprecated for alias definition \"{id}\" in \"{}\"",
                        child.name(),
                        self.file.display()
                    ))
                    .with_code(ErrorCode::E301)
                    .with_label(child.span(), "element is ignored"),
                    id,
                ),
            );
        }
    }

    /// Resolve a `<factory>` or `<configurator>` child.
    fn callable(
        &self,
        service: &Element,
        name: &str,
        id: &str,
        registry: &mut Registry,
        diagnostics: &mut DiagnosticCollector,
        depth: usize,
    ) -> Result<Option<Callable>> {
        let Some(element) = service.first_services_child(name) else {
            return Ok(None);
        };

        if let Some(function) = truthy_attribute(element, "function") {
            return Ok(Some(Callable::Function(function.to_string())));
        }

        let target = if let Some(inline) = element.first_services_child("service") {
            if depth >= self.max_depth {
                return Err(self.locate(
                    Diagnostic::error(format!(
                        "inline service definitions nest deeper than {} levels in \"{}\"",
                        self.max_depth,
                        self.file.display()
                    ))
                    .with_code(ErrorCode::E103)
                    .with_label(inline.span(), "nesting limit reached here")
                    .with_help("raise `max_nesting_depth` or declare the service at the top level"),
                    id,
                ));
            }

            let inline_id = inline.attribute("id").unwrap_or_default();
            let no_defaults = Defaults::empty();
            match self.resolve_at_depth(
                inline,
                inline_id,
                &no_defaults,
                registry,
                diagnostics,
                depth + 1,
            )? {
                Some(entry) => CallableTarget::Inline(Box::new(entry)),
                None => CallableTarget::None,
            }
        } else if let Some(target_id) = truthy_attribute(element, "service") {
            let behavior =
                InvalidBehavior::from_attribute(element.attribute("on-invalid").unwrap_or_default());
            CallableTarget::Service(Reference::new(target_id, behavior))
        } else if let Some(class) = element.attribute("class") {
            CallableTarget::Class(class.to_string())
        } else {
            CallableTarget::None
        };

        Ok(Some(Callable::Method {
            target,
            method: element.attribute("method").unwrap_or_default().to_string(),
        }))
    }

    /// Tags of a service: its own, or else the defaults' tags.
    fn tags(&self, service: &Element, id: &str, defaults: &Defaults<'_>) -> Result<Vec<Tag>> {
        let own: Vec<&Element> = service.services_children("tag").collect();
        let elements = if own.is_empty() {
            defaults.tags()
        } else {
            own.as_slice()
        };

        let mut tags = Vec::with_capacity(elements.len());
        for element in elements {
            let mut parameters = IndexMap::new();
            for attribute in element.attributes() {
                let key = attribute.name();
                if key == "name" {
                    continue;
                }
                let value = Scalar::phpize(attribute.value());
                if key.contains('-') && !key.contains('_') {
                    parameters
                        .entry(key.replace('-', "_"))
                        .or_insert_with(|| value.clone());
                }
                parameters.insert(key.to_string(), value);
            }

            let name = element.attribute("name").unwrap_or_default();
            if name.is_empty() {
                return Err(self.locate(
                    Diagnostic::error(format!(
                        "the tag name for service \"{id}\" in \"{}\" must be a non-empty string",
                        self.file.display()
                    ))
                    .with_code(ErrorCode::E101)
                    .with_label(element.span(), "tag without a name"),
                    id,
                ));
            }

            tags.push(Tag::new(name, parameters));
        }

        Ok(tags)
    }

    /// Attach the file and, when known, the service to a diagnostic.
    fn locate(&self, diagnostic: Diagnostic, id: &str) -> Diagnostic {
        let diagnostic = diagnostic.with_file(self.file);
        if id.is_empty() || diagnostic.service().is_some() {
            diagnostic
        } else {
            diagnostic.with_service(id)
        }
    }
}

/// Attribute value when present, non-empty and not `"0"`.
fn truthy_attribute<'e>(element: &'e Element, name: &str) -> Option<&'e str> {
    element
        .attribute(name)
        .filter(|value| !value.is_empty() && *value != "0")
}
