//! The service registry.
//!
//! [`Registry`] is an insertion-ordered map from service identifier to
//! [`ServiceEntry`]. Writing an identifier that already exists replaces the
//! previous entry and keeps its position.

use indexmap::IndexMap;
use log::debug;

use crate::blueprint::{Alias, Blueprint, ServiceEntry};

/// Insertion-ordered map of service entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    entries: IndexMap<String, ServiceEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blueprint (or child blueprint) under `id`.
    ///
    /// Any previous entry with the same identifier, alias included, is replaced.
    pub fn set_definition(&mut self, id: impl Into<String>, entry: impl Into<ServiceEntry>) {
        let id = id.into();
        let entry = entry.into();
        if let Some(previous) = self.entries.insert(id.clone(), entry) {
            debug!(id, previous = previous.kind(); "Replaced existing service entry");
        }
    }

    /// Store an alias under `id`.
    pub fn set_alias(&mut self, id: impl Into<String>, alias: Alias) {
        self.set_definition(id, ServiceEntry::Alias(alias));
    }

    pub fn get(&self, id: &str) -> Option<&ServiceEntry> {
        self.entries.get(id)
    }

    /// Get the construction data for `id`, if it is not an alias.
    pub fn blueprint(&self, id: &str) -> Option<&Blueprint> {
        self.entries.get(id).and_then(ServiceEntry::as_blueprint)
    }

    pub fn alias(&self, id: &str) -> Option<&Alias> {
        self.entries.get(id).and_then(ServiceEntry::as_alias)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Iterate over all identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over non-alias entries.
    pub fn definitions(&self) -> impl Iterator<Item = (&str, &ServiceEntry)> {
        self.iter().filter(|(_, entry)| !entry.is_alias())
    }

    /// Iterate over alias entries.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &Alias)> {
        self.entries
            .iter()
            .filter_map(|(id, entry)| entry.as_alias().map(|alias| (id.as_str(), alias)))
    }
}
