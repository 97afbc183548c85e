//! Point-in-time snapshot of the store's schema state

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::definition::{ClassDefinition, PropertyDefinition};
use crate::normalize::normalize_name;

/// What the target store currently holds, as reported by an external query
///
/// The snapshot is immutable: it has no mutation methods and is rebuilt
/// fresh for each diff. Lookups go through normalized names, matching the
/// canonicalization the store itself applies on write.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExistingOntology {
    properties: BTreeMap<String, PropertyDefinition>,
    classes: BTreeMap<String, ClassDefinition>,
}

impl ExistingOntology {
    /// Build a snapshot from the store's name-keyed maps
    ///
    /// Keys are re-normalized on the way in so the snapshot never depends
    /// on the store having canonicalized consistently.
    pub fn new(
        properties: BTreeMap<String, PropertyDefinition>,
        classes: BTreeMap<String, ClassDefinition>,
    ) -> Self {
        let properties = properties
            .into_iter()
            .map(|(k, v)| (normalize_name(&k), v))
            .collect();
        let classes = classes
            .into_iter()
            .map(|(k, v)| (normalize_name(&k), v))
            .collect();
        Self {
            properties,
            classes,
        }
    }

    /// An empty snapshot (everything in a template diffs to "new")
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a property by any spelling of its name
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.get(&normalize_name(name))
    }

    /// Look up a class by any spelling of its name
    pub fn class(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.get(&normalize_name(name))
    }

    /// Normalized property names present in the snapshot
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Normalized class names present in the snapshot
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.classes.is_empty()
    }
}
