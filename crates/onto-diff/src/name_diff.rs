//! Name-only diff for the sync path
//!
//! The sync engine compares a freshly fetched template against the
//! store's name lists to build a preview. It cannot do field-level
//! comparison there: the fetched document has full definitions, but the
//! cheap store query returns names only. This variant classifies by
//! normalized name alone and is only ever computed after the content
//! checksum has already changed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use onto_model::normalize_name;

/// Added/updated/removed name lists, normalized and sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameDiff {
    /// In the template but not the store
    pub added: Vec<String>,
    /// Present on both sides; the content changed, so these may carry
    /// field-level updates the name comparison cannot see
    pub updated: Vec<String>,
    /// In the store but not the template
    pub removed: Vec<String>,
}

impl NameDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} added, {} updated, {} removed",
            self.added.len(),
            self.updated.len(),
            self.removed.len()
        )
    }
}

/// Compare template names against store names
///
/// Both inputs may use any spelling; classification happens on the
/// normalized forms.
pub fn name_diff<'a, T, E>(template_names: T, existing_names: E) -> NameDiff
where
    T: IntoIterator<Item = &'a str>,
    E: IntoIterator<Item = &'a str>,
{
    let template: BTreeSet<String> = template_names
        .into_iter()
        .map(normalize_name)
        .filter(|n| !n.is_empty())
        .collect();
    let existing: BTreeSet<String> = existing_names
        .into_iter()
        .map(normalize_name)
        .filter(|n| !n.is_empty())
        .collect();

    NameDiff {
        added: template.difference(&existing).cloned().collect(),
        updated: template.intersection(&existing).cloned().collect(),
        removed: existing.difference(&template).cloned().collect(),
    }
}
