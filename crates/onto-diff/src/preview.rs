//! Change-set report types
//!
//! The [`ChangeSet`] is the structured output of diffing a template
//! against a store snapshot, and the preview shown to callers before an
//! import is applied.

use serde::{Deserialize, Serialize};

use onto_model::{ClassDefinition, EntityKind, PropertyDefinition};

/// An update to an existing definition, with the list of changed fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord<T> {
    /// Normalized name the update resolves to in the snapshot
    pub name: String,
    /// Definition as currently stored
    pub before: T,
    /// Definition as the template wants it
    pub after: T,
    /// Wire names of the fields that differ (`type`, `parent`, ...)
    pub changes: Vec<String>,
}

/// An update touching fields considered unsafe to auto-apply
///
/// Conflicts are a flag laid over the update lists, not a separate
/// partition: every conflict's `name` also appears in the corresponding
/// `updated_*` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: EntityKind,
    pub name: String,
    /// Exactly the critical fields that changed, not the full change list
    pub fields: Vec<String>,
    /// Human-readable reason naming the critical fields
    pub reason: String,
}

/// Aggregate counts over a change-set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub new_count: usize,
    pub updated_count: usize,
    pub conflict_count: usize,
}

impl ChangeSummary {
    pub fn total(&self) -> usize {
        self.new_count + self.updated_count
    }
}

/// Output of the diff engine: what an import would do
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Definitions not present in the snapshot (full definitions)
    pub new_classes: Vec<ClassDefinition>,
    pub new_properties: Vec<PropertyDefinition>,
    /// Definitions present in the snapshot with at least one changed field
    pub updated_classes: Vec<UpdateRecord<ClassDefinition>>,
    pub updated_properties: Vec<UpdateRecord<PropertyDefinition>>,
    pub conflicts: Vec<Conflict>,
    pub summary: ChangeSummary,
}

impl ChangeSet {
    /// A change-set with nothing to do
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when applying this change-set would be a no-op
    pub fn is_empty(&self) -> bool {
        self.new_classes.is_empty()
            && self.new_properties.is_empty()
            && self.updated_classes.is_empty()
            && self.updated_properties.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Recompute the summary from the four lists
    pub(crate) fn finalize(mut self) -> Self {
        self.summary = ChangeSummary {
            new_count: self.new_classes.len() + self.new_properties.len(),
            updated_count: self.updated_classes.len() + self.updated_properties.len(),
            conflict_count: self.conflicts.len(),
        };
        self
    }
}
