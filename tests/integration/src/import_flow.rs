//! End-to-end import flows over the in-memory fakes

use std::sync::Arc;

use pretty_assertions::assert_eq;

use onto_backend::ConflictStrategy;
use onto_core::{AppliedCounts, Error, ImportOptions, Importer};
use onto_model::{Cardinality, PropertyType};
use onto_test_utils::{FakeEntityStore, JsonParser};

fn importer(store: &Arc<FakeEntityStore>) -> Importer {
    Importer::new(Arc::new(JsonParser), store.clone())
}

const CRM_TEMPLATE: &str = r#"{
    "properties": [
        {"name": "Email", "type": "text"},
        {"name": "Phone Number", "type": "text"},
        {"name": "Tags", "type": "text", "cardinality": "many"}
    ],
    "classes": [
        {"name": "Contact", "properties": ["email", "phone-number"]},
        {"name": "Customer", "parent": "Contact", "properties": ["tags"]}
    ]
}"#;

#[tokio::test]
async fn fresh_import_then_reimport_is_idempotent() {
    let store = Arc::new(FakeEntityStore::new());
    let imp = importer(&store);

    let first = imp.import(CRM_TEMPLATE, ImportOptions::new()).await;
    assert!(first.success, "errors: {:?}", first.errors);
    assert_eq!(first.applied, AppliedCounts { classes: 2, properties: 3 });

    // Every property was created before any class
    let calls = store.calls();
    let first_class = calls.iter().position(|c| c.starts_with("create-class")).unwrap();
    assert!(
        calls[..first_class].iter().all(|c| c.starts_with("create-property")),
        "properties must precede classes: {calls:?}"
    );

    // Second import of the same document changes nothing
    let second = imp.import(CRM_TEMPLATE, ImportOptions::new()).await;
    assert!(second.success);
    assert_eq!(second.applied, AppliedCounts::default());
    assert!(second.preview.unwrap().is_empty());
}

#[tokio::test]
async fn respelled_names_do_not_duplicate_entities() {
    let store = Arc::new(FakeEntityStore::new());
    let imp = importer(&store);
    imp.import(CRM_TEMPLATE, ImportOptions::new()).await;

    // Same ontology, different case and spacing
    let respelled = r#"{
        "properties": [{"name": "PHONE  NUMBER", "type": "text"}],
        "classes": [{"name": "contact", "properties": ["email", "phone-number"]}]
    }"#;
    let result = imp.import(respelled, ImportOptions::new()).await;
    assert!(result.success);
    let preview = result.preview.unwrap();
    assert!(preview.new_properties.is_empty());
    assert!(preview.new_classes.is_empty());
}

#[tokio::test]
async fn conflict_roundtrip_ask_blocks_then_overwrite_applies() {
    let store = Arc::new(FakeEntityStore::new());
    let imp = importer(&store);
    imp.import(CRM_TEMPLATE, ImportOptions::new()).await;

    // Tags narrows from many to one: critical cardinality change
    let narrowed = r#"{
        "properties": [{"name": "Tags", "type": "text", "cardinality": "one"}]
    }"#;

    let blocked = imp.import(narrowed, ImportOptions::new()).await;
    assert!(!blocked.success);
    assert!(matches!(blocked.errors[0], Error::UnresolvedConflicts { count: 1 }));
    assert_eq!(
        store.property("tags").unwrap().cardinality,
        Cardinality::Many,
        "blocked import must not touch the store"
    );

    let forced = imp
        .import(narrowed, ImportOptions::new().strategy(ConflictStrategy::Overwrite))
        .await;
    assert!(forced.success);
    assert_eq!(store.property("tags").unwrap().cardinality, Cardinality::One);
}

#[tokio::test]
async fn partial_failure_leaves_applied_items_standing() {
    let store = Arc::new(FakeEntityStore::new());
    store.fail_on("Customer");
    let imp = importer(&store);

    let result = imp.import(CRM_TEMPLATE, ImportOptions::new()).await;
    assert!(!result.success);
    assert_eq!(result.applied, AppliedCounts { classes: 1, properties: 3 });
    assert_eq!(result.errors.len(), 1);

    // Everything else landed; the caller decides about cleanup
    assert!(store.property("email").is_some());
    assert!(store.class("contact").is_some());
    assert!(store.class("customer").is_none());
}

#[tokio::test]
async fn preview_sees_type_conflicts_without_side_effects() {
    let store = Arc::new(FakeEntityStore::new());
    let imp = importer(&store);
    imp.import(CRM_TEMPLATE, ImportOptions::new()).await;
    let mutations_before = store.calls().len();

    let retyped = r#"{
        "properties": [{"name": "Email", "type": "page-reference"}]
    }"#;
    let preview = imp.preview(retyped).await.unwrap();
    assert_eq!(preview.conflicts.len(), 1);
    assert_eq!(preview.conflicts[0].fields, ["type"]);
    assert_eq!(preview.updated_properties[0].before.prop_type, PropertyType::Text);
    assert_eq!(
        preview.updated_properties[0].after.prop_type,
        PropertyType::PageRef
    );
    assert_eq!(store.calls().len(), mutations_before);
}
