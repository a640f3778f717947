//! Anonymous service discovery and flattening.
//!
//! Services declared without an identifier get a synthetic one of the form
//! `{counter}_{sha256(file path)}`. Two kinds are found:
//!
//! - inline declarations: an `<argument>` or `<property>` with
//!   `type="service"` and no `id`, optionally wrapping a nested `<service>`;
//! - wild declarations: a top-level `<services><service>` without `id`.
//!
//! Discovery only records identifiers in a side table keyed by [`NodeId`];
//! the document itself is never modified. Registration then resolves the
//! nested declarations from the highest counter down, so deeper services
//! land in the registry before the services that contain them.

use std::{collections::HashMap, path::Path};

use log::debug;
use sha2::{Digest, Sha256};

use armature_core::{
    blueprint::{Alias, ServiceEntry},
    registry::Registry,
};

use crate::{
    defaults::Defaults,
    definition::DefinitionResolver,
    document::{Element, NodeId, SERVICES_NAMESPACE},
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Result},
};

/// Synthetic identifiers by the node that received them.
pub(crate) type AnonymousIds = HashMap<NodeId, String>;

/// Generates anonymous identifiers for one document.
#[derive(Debug, Clone)]
pub(crate) struct AnonymousIdGenerator {
    suffix: String,
    counter: usize,
}

impl AnonymousIdGenerator {
    pub fn new(file: &Path) -> Self {
        let digest = Sha256::digest(file.to_string_lossy().as_bytes());
        Self {
            suffix: format!("{digest:x}"),
            counter: 0,
        }
    }

    /// Next identifier together with its counter value.
    pub fn next_id(&mut self) -> (usize, String) {
        self.counter += 1;
        (self.counter, format!("{}_{}", self.counter, self.suffix))
    }
}

#[derive(Debug, Clone)]
struct Discovered<'d> {
    counter: usize,
    id: String,
    service: &'d Element,
    wild: bool,
}

/// Anonymous services found in one document.
#[derive(Debug, Clone, Default)]
pub(crate) struct AnonymousServices<'d> {
    ids: AnonymousIds,
    discovered: Vec<Discovered<'d>>,
}

impl<'d> AnonymousServices<'d> {
    /// Walk the document and assign identifiers in document order.
    ///
    /// Wild services are reported as deprecated.
    pub fn discover(
        root: &'d Element,
        file: &Path,
        diagnostics: &mut DiagnosticCollector,
    ) -> Self {
        let mut generator = AnonymousIdGenerator::new(file);
        let mut found = Self::default();

        let wrappers = root.descendants().into_iter().filter(|element| {
            (element.is(SERVICES_NAMESPACE, "argument") || element.is(SERVICES_NAMESPACE, "property"))
                && element.attribute("type") == Some("service")
                && !element.has_attribute("id")
        });
        for wrapper in wrappers {
            let (counter, id) = generator.next_id();
            found.ids.insert(wrapper.id(), id.clone());
            if let Some(service) = wrapper.first_services_child("service") {
                found.discovered.push(Discovered {
                    counter,
                    id,
                    service,
                    wild: false,
                });
            }
        }

        let wild_services = root
            .services_children("services")
            .flat_map(|services| services.services_children("service"))
            .filter(|service| !service.has_attribute("id"));
        for service in wild_services {
            let (counter, id) = generator.next_id();
            diagnostics.emit(
                Diagnostic::warning(format!(
                    "top-level anonymous services are deprecated; the service in \"{}\" was registered as \"{id}\"",
                    file.display()
                ))
                .with_code(ErrorCode::E302)
                .with_file(file)
                .with_service(id.clone())
                .with_label(service.span(), "service without an id")
                .with_help("give the service an explicit \"id\" attribute"),
            );
            found.ids.insert(service.id(), id.clone());
            found.discovered.push(Discovered {
                counter,
                id,
                service,
                wild: true,
            });
        }

        debug!(
            file:? = file,
            references = found.ids.len(),
            services = found.discovered.len();
            "Discovered anonymous services"
        );

        found
    }

    /// Identifiers assigned to argument wrappers and wild services.
    pub fn ids(&self) -> &AnonymousIds {
        &self.ids
    }

    /// Number of anonymous service declarations.
    pub fn len(&self) -> usize {
        self.discovered.len()
    }

    /// Resolve every discovered declaration into `registry`.
    ///
    /// Declarations are processed in descending counter order. Wild services
    /// receive the document defaults, inline ones none; all of them end up
    /// private.
    pub fn register(
        &self,
        resolver: &DefinitionResolver<'_>,
        defaults: &Defaults<'_>,
        registry: &mut Registry,
        diagnostics: &mut DiagnosticCollector,
    ) -> Result<()> {
        let no_defaults = Defaults::empty();

        let mut ordered: Vec<&Discovered<'d>> = self.discovered.iter().collect();
        ordered.sort_by_key(|discovered| discovered.counter);

        for discovered in ordered.into_iter().rev() {
            let defaults = if discovered.wild {
                defaults
            } else {
                &no_defaults
            };

            match resolver.resolve(discovered.service, &discovered.id, defaults, registry, diagnostics)? {
                Some(mut entry) => {
                    if let Some(blueprint) = entry.as_blueprint_mut() {
                        blueprint.set_public(false);
                    }
                    registry.set_definition(discovered.id.clone(), entry);
                }
                None => {
                    if let Some(ServiceEntry::Alias(alias)) = registry.get(&discovered.id) {
                        let private = Alias::new(alias.target(), false);
                        registry.set_alias(discovered.id.clone(), private);
                    }
                }
            }
        }

        Ok(())
    }
}
