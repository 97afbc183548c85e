//! Field-level diff with conflict classification
//!
//! `diff` is a pure function: template + snapshot in, [`ChangeSet`] out.
//! It performs no I/O, holds no state, and never fails on well-typed
//! input, which is what lets the orchestration layers above call it
//! without an error path.

use tracing::debug;

use onto_model::{
    ClassDefinition, EntityKind, ExistingOntology, ParsedTemplate, PropertyDefinition,
    normalize_name,
};

use crate::policy::ConflictPolicy;
use crate::preview::{ChangeSet, Conflict, UpdateRecord};

/// Compare a parsed template against the store snapshot
///
/// Every template definition resolves through [`normalize_name`], so a
/// name differing from the snapshot only by case or internal spacing is
/// an update (or a no-op), never a duplicate creation. Definitions whose
/// every field matches are dropped entirely — they appear in no list and
/// no count.
pub fn diff(
    template: &ParsedTemplate,
    existing: &ExistingOntology,
    policy: &ConflictPolicy,
) -> ChangeSet {
    let mut out = ChangeSet::empty();

    for prop in &template.properties {
        match existing.property(&prop.name) {
            None => out.new_properties.push(prop.clone()),
            Some(before) => {
                let changes = property_changes(before, prop);
                if changes.is_empty() {
                    continue;
                }
                let name = normalize_name(&prop.name);
                let critical = policy.critical_property_fields(&changes);
                if !critical.is_empty() {
                    out.conflicts
                        .push(conflict(EntityKind::Property, &name, critical));
                }
                out.updated_properties.push(UpdateRecord {
                    name,
                    before: before.clone(),
                    after: prop.clone(),
                    changes,
                });
            }
        }
    }

    for class in &template.classes {
        match existing.class(&class.name) {
            None => out.new_classes.push(class.clone()),
            Some(before) => {
                let changes = class_changes(before, class);
                if changes.is_empty() {
                    continue;
                }
                let name = normalize_name(&class.name);
                let critical = policy.critical_class_fields(&changes);
                if !critical.is_empty() {
                    out.conflicts
                        .push(conflict(EntityKind::Class, &name, critical));
                }
                out.updated_classes.push(UpdateRecord {
                    name,
                    before: before.clone(),
                    after: class.clone(),
                    changes,
                });
            }
        }
    }

    let out = out.finalize();
    debug!(
        new = out.summary.new_count,
        updated = out.summary.updated_count,
        conflicts = out.summary.conflict_count,
        "computed change-set"
    );
    out
}

fn conflict(kind: EntityKind, name: &str, fields: Vec<String>) -> Conflict {
    let reason = format!("Critical {kind} field(s) changed: {}", fields.join(", "));
    Conflict {
        kind,
        name: name.to_string(),
        fields,
        reason,
    }
}

/// Wire names of property fields that differ between two definitions
///
/// The `name` field is identity, not content: two spellings that
/// normalize to the same name are the same entity. Name-valued fields
/// (`classes`) are compared through normalization for the same reason.
fn property_changes(before: &PropertyDefinition, after: &PropertyDefinition) -> Vec<String> {
    let mut changes = Vec::new();
    if before.prop_type != after.prop_type {
        changes.push("type".to_string());
    }
    if before.cardinality != after.cardinality {
        changes.push("cardinality".to_string());
    }
    if before.description != after.description {
        changes.push("description".to_string());
    }
    if before.title != after.title {
        changes.push("title".to_string());
    }
    if before.hide != after.hide {
        changes.push("hide".to_string());
    }
    if normalized_list(&before.classes) != normalized_list(&after.classes) {
        changes.push("classes".to_string());
    }
    changes
}

/// Wire names of class fields that differ between two definitions
fn class_changes(before: &ClassDefinition, after: &ClassDefinition) -> Vec<String> {
    let mut changes = Vec::new();
    if before.parent.as_deref().map(normalize_name) != after.parent.as_deref().map(normalize_name) {
        changes.push("parent".to_string());
    }
    if normalized_list(&before.properties) != normalized_list(&after.properties) {
        changes.push("properties".to_string());
    }
    if before.description != after.description {
        changes.push("description".to_string());
    }
    if before.icon != after.icon {
        changes.push("icon".to_string());
    }
    changes
}

fn normalized_list(names: &[String]) -> Vec<String> {
    names.iter().map(|n| normalize_name(n)).collect()
}
