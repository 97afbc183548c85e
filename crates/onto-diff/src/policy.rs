//! Conflict classification policy
//!
//! Which fields count as "critical" — unsafe to auto-apply — is policy,
//! not a law of nature. The defaults mirror the backing store's behavior
//! (`parent` rewires inheritance; `type` and `cardinality` changes are
//! potentially data-lossy), but callers can widen or narrow the sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Critical-field sets used by conflict classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPolicy {
    /// Class fields whose change is flagged as a conflict
    pub class_fields: BTreeSet<String>,
    /// Property fields whose change is flagged as a conflict
    pub property_fields: BTreeSet<String>,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self {
            class_fields: ["parent"].into_iter().map(String::from).collect(),
            property_fields: ["type", "cardinality"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ConflictPolicy {
    /// A policy that never flags anything (every change auto-applies)
    pub fn permissive() -> Self {
        Self {
            class_fields: BTreeSet::new(),
            property_fields: BTreeSet::new(),
        }
    }

    /// Intersection of a change list with the class-critical set
    pub fn critical_class_fields(&self, changes: &[String]) -> Vec<String> {
        changes
            .iter()
            .filter(|f| self.class_fields.contains(f.as_str()))
            .cloned()
            .collect()
    }

    /// Intersection of a change list with the property-critical set
    pub fn critical_property_fields(&self, changes: &[String]) -> Vec<String> {
        changes
            .iter()
            .filter(|f| self.property_fields.contains(f.as_str()))
            .cloned()
            .collect()
    }
}
