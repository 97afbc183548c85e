//! Parsed ontology template

use serde::{Deserialize, Serialize};

use crate::definition::{ClassDefinition, PropertyDefinition};

/// A portable ontology as produced by the external parser
///
/// This is the input side of reconciliation: what the document says the
/// schema should be, before comparison against the live store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ParsedTemplate {
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
    #[serde(default)]
    pub classes: Vec<ClassDefinition>,
}

impl ParsedTemplate {
    /// An empty template (diffs to an all-empty change-set)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.classes.is_empty()
    }

    /// Total number of definitions in the template
    pub fn len(&self) -> usize {
        self.properties.len() + self.classes.len()
    }
}
