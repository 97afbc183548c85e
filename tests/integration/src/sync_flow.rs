//! End-to-end sync flows: fetch, gate, apply, persist

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use onto_backend::{ConflictStrategy, SourceType, SyncSource};
use onto_core::{
    AppliedCounts, FileStorage, ImportOptions, Importer, MemoryStorage, Result, RetryPolicy,
    StatePatch, SyncApplier, SyncEngine, SyncOptions, SyncStateStore,
};
use onto_diff::NameDiff;
use onto_test_utils::{FakeEntityStore, JsonParser, ScriptedFetcher};

const V1: &str = r#"{
    "properties": [{"name": "Email", "type": "text"}],
    "classes": [{"name": "Person", "properties": ["email"]}]
}"#;

const V2: &str = r#"{
    "properties": [
        {"name": "Email", "type": "text"},
        {"name": "Birthday", "type": "date"}
    ],
    "classes": [{"name": "Person", "properties": ["email", "birthday"]}]
}"#;

/// Applier that runs the fetched content through a real import
struct ImportingApplier {
    importer: Importer,
}

#[async_trait]
impl SyncApplier for ImportingApplier {
    async fn apply(
        &self,
        _source: &SyncSource,
        content: &str,
        _preview: &NameDiff,
    ) -> Result<AppliedCounts> {
        let result = self
            .importer
            .import(content, ImportOptions::new().strategy(ConflictStrategy::Overwrite))
            .await;
        match result.errors.into_iter().next() {
            None => Ok(result.applied),
            Some(err) => Err(err),
        }
    }
}

fn source() -> SyncSource {
    SyncSource {
        id: "crm".to_string(),
        name: "CRM ontology".to_string(),
        location: "https://example.com/crm.json".to_string(),
        source_type: SourceType::Url,
        default_strategy: ConflictStrategy::Ask,
    }
}

fn engine_over(
    store: &Arc<FakeEntityStore>,
    fetcher: &Arc<ScriptedFetcher>,
    state: SyncStateStore,
) -> SyncEngine {
    let applier = ImportingApplier {
        importer: Importer::new(Arc::new(JsonParser), store.clone()),
    };
    let mut engine = SyncEngine::new(
        fetcher.clone(),
        Arc::new(JsonParser),
        store.clone(),
        state,
        Arc::new(applier),
    )
    .with_retry(RetryPolicy {
        max_attempts: 2,
        base_delay: std::time::Duration::from_millis(1),
    });
    engine.register_source(source());
    engine
}

#[tokio::test]
async fn sync_imports_remote_ontology_then_gates_on_checksum() {
    let store = Arc::new(FakeEntityStore::new());
    let fetcher = Arc::new(ScriptedFetcher::serving(V1));
    let engine = engine_over(&store, &fetcher, SyncStateStore::new(Arc::new(MemoryStorage::new())));

    let first = engine.sync("crm", None, SyncOptions::default()).await;
    assert!(first.has_updates, "errors: {:?}", first.errors);
    assert!(first.errors.is_empty());
    assert_eq!(
        first.applied,
        Some(AppliedCounts { classes: 1, properties: 1 })
    );
    assert!(store.property("email").is_some());
    assert!(store.class("person").is_some());

    // Identical content again: gated, no second apply
    let second = engine.sync("crm", None, SyncOptions::default()).await;
    assert!(!second.has_updates);
    assert!(store.property("birthday").is_none());
}

#[tokio::test]
async fn changed_remote_content_flows_through_as_update() {
    let store = Arc::new(FakeEntityStore::new());
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.push_ok(V1);
    fetcher.push_ok(V2);
    let engine = engine_over(&store, &fetcher, SyncStateStore::new(Arc::new(MemoryStorage::new())));

    engine.sync("crm", None, SyncOptions::default()).await;
    let report = engine.sync("crm", None, SyncOptions::default()).await;

    assert!(report.has_updates);
    let preview = report.preview.unwrap();
    assert_eq!(preview.added, ["birthday"]);
    assert_eq!(preview.updated, ["email", "person"]);
    assert!(store.property("birthday").is_some());
}

#[tokio::test]
async fn check_is_side_effect_free_on_the_store() {
    let store = Arc::new(FakeEntityStore::new());
    let fetcher = Arc::new(ScriptedFetcher::serving(V1));
    let engine = engine_over(&store, &fetcher, SyncStateStore::new(Arc::new(MemoryStorage::new())));

    let report = engine.check_for_updates("crm").await;
    assert!(report.has_updates);
    assert!(store.calls().is_empty(), "check must not mutate the store");
}

#[tokio::test]
async fn local_modifications_survive_until_resolved() {
    let store = Arc::new(FakeEntityStore::new());
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.push_ok(V1);
    fetcher.push_ok(V2);
    fetcher.push_ok(V2);
    let state = SyncStateStore::new(Arc::new(MemoryStorage::new()));
    let engine = engine_over(&store, &fetcher, state);

    engine.sync("crm", None, SyncOptions::default()).await;
    // The user edits the ontology locally
    engine
        .state()
        .update("crm", StatePatch::default().with_local_modifications(true))
        .await
        .unwrap();

    let blocked = engine.sync("crm", None, SyncOptions::default()).await;
    assert!(blocked.has_updates);
    assert!(!blocked.errors.is_empty());
    assert!(store.property("birthday").is_none());

    // Explicit overwrite resolves the standoff and clears the flag
    let forced = engine
        .sync("crm", Some(ConflictStrategy::Overwrite), SyncOptions::default())
        .await;
    assert!(forced.errors.is_empty());
    assert!(store.property("birthday").is_some());
    let state = engine.state().get("crm").await.unwrap().unwrap();
    assert!(!state.local_modifications);
}

#[tokio::test]
async fn sync_state_persists_across_engine_instances() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FakeEntityStore::new());
    let fetcher = Arc::new(ScriptedFetcher::serving(V1));

    {
        let state = SyncStateStore::new(Arc::new(FileStorage::new(dir.path())));
        let engine = engine_over(&store, &fetcher, state);
        let report = engine.sync("crm", None, SyncOptions::default()).await;
        assert!(report.errors.is_empty());
    }

    // A fresh engine over the same directory sees the recorded checksum
    let state = SyncStateStore::new(Arc::new(FileStorage::new(dir.path())));
    let engine = engine_over(&store, &fetcher, state);
    let report = engine.sync("crm", None, SyncOptions::default()).await;
    assert!(!report.has_updates, "persisted checksum must gate the sync");

    let ids = engine.state().list_source_ids().await.unwrap();
    assert_eq!(ids, ["crm"]);
}
