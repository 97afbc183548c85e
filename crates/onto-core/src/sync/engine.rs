//! SyncEngine implementation
//!
//! The engine coordinates, per registered source: fetch (with retry),
//! checksum gating against the state store, a name-only preview, the
//! local-modifications guard, and a caller-supplied apply step. Both
//! entry points resolve every documented failure mode into the returned
//! report; neither ever propagates a collaborator error.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use onto_backend::{
    ConflictStrategy, ContentFetcher, EntityStore, FetchError, FetchedContent, SyncSource,
    TemplateParser,
};
use onto_diff::{NameDiff, name_diff};

use crate::error::{Error, Result};
use crate::import::AppliedCounts;
use crate::state::{StatePatch, SyncAction, SyncOutcome, SyncStateStore};

/// Default bound on a single fetch attempt
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry schedule for transient fetch failures
///
/// Backoff is linear: attempt `n` sleeps `base_delay * n` before the
/// next try. Permanent errors (not-found, invalid source) never consume
/// retry budget.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Options accepted by [`SyncEngine::sync`]
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Build the preview but do not apply or touch sync state
    pub dry_run: bool,
    /// Bound on each fetch attempt
    pub timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Result of [`SyncEngine::check_for_updates`]
#[derive(Debug, Default)]
pub struct CheckReport {
    pub has_updates: bool,
    pub preview: Option<NameDiff>,
    pub errors: Vec<Error>,
}

/// Result of [`SyncEngine::sync`]
#[derive(Debug, Default)]
pub struct SyncReport {
    pub has_updates: bool,
    pub preview: Option<NameDiff>,
    pub applied: Option<AppliedCounts>,
    pub errors: Vec<Error>,
}

/// Caller-supplied apply step
///
/// The engine decides *whether* to apply; what application means (a full
/// import, a partial merge, a host-side command) belongs to the caller.
#[async_trait]
pub trait SyncApplier: Send + Sync {
    async fn apply(
        &self,
        source: &SyncSource,
        content: &str,
        preview: &NameDiff,
    ) -> Result<AppliedCounts>;
}

/// Engine for synchronizing registered sources against the store
pub struct SyncEngine {
    sources: BTreeMap<String, SyncSource>,
    fetcher: Arc<dyn ContentFetcher>,
    parser: Arc<dyn TemplateParser>,
    store: Arc<dyn EntityStore>,
    state: SyncStateStore,
    applier: Arc<dyn SyncApplier>,
    retry: RetryPolicy,
}

impl SyncEngine {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        parser: Arc<dyn TemplateParser>,
        store: Arc<dyn EntityStore>,
        state: SyncStateStore,
        applier: Arc<dyn SyncApplier>,
    ) -> Self {
        Self {
            sources: BTreeMap::new(),
            fetcher,
            parser,
            store,
            state,
            applier,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Register a source; replaces any previous registration with the same id
    pub fn register_source(&mut self, source: SyncSource) {
        self.sources.insert(source.id.clone(), source);
    }

    pub fn source(&self, id: &str) -> Option<&SyncSource> {
        self.sources.get(id)
    }

    /// The per-source sync state CRUD surface
    pub fn state(&self) -> &SyncStateStore {
        &self.state
    }

    /// Side-effect-free update probe (besides recording a `check` event)
    pub async fn check_for_updates(&self, source_id: &str) -> CheckReport {
        let mut report = CheckReport::default();

        // Unknown source: nothing to record history against
        let Some(source) = self.sources.get(source_id) else {
            report.errors.push(Error::InvalidSource {
                id: source_id.to_string(),
            });
            return report;
        };

        let fetched = match self.fetch_with_retry(source, DEFAULT_FETCH_TIMEOUT).await {
            Ok(fetched) => fetched,
            Err(err) => {
                self.record(&mut report.errors, source_id, SyncAction::Check, SyncOutcome::Failed, err.to_string())
                    .await;
                report.errors.push(err.into());
                return report;
            }
        };

        if self.checksum_matches(&mut report.errors, source_id, &fetched).await {
            self.record(&mut report.errors, source_id, SyncAction::Check, SyncOutcome::Success, "no updates")
                .await;
            return report;
        }

        let preview = match self.build_preview(&fetched.content).await {
            Ok(preview) => preview,
            Err(err) => {
                self.record(&mut report.errors, source_id, SyncAction::Check, SyncOutcome::Failed, err.to_string())
                    .await;
                report.errors.push(err);
                return report;
            }
        };

        self.record(&mut report.errors, source_id, SyncAction::Check, SyncOutcome::Success, preview.summary())
            .await;
        report.has_updates = true;
        report.preview = Some(preview);
        report
    }

    /// Synchronize one source
    ///
    /// `strategy` overrides the source's default for this call only.
    pub async fn sync(
        &self,
        source_id: &str,
        strategy: Option<ConflictStrategy>,
        options: SyncOptions,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        let Some(source) = self.sources.get(source_id) else {
            report.errors.push(Error::InvalidSource {
                id: source_id.to_string(),
            });
            return report;
        };
        let strategy = strategy.unwrap_or(source.default_strategy);

        let fetched = match self.fetch_with_retry(source, options.timeout).await {
            Ok(fetched) => fetched,
            Err(err) => {
                self.record(&mut report.errors, source_id, SyncAction::Sync, SyncOutcome::Failed, err.to_string())
                    .await;
                report.errors.push(err.into());
                return report;
            }
        };

        if self.checksum_matches(&mut report.errors, source_id, &fetched).await {
            self.record(&mut report.errors, source_id, SyncAction::Sync, SyncOutcome::Success, "no updates")
                .await;
            return report;
        }
        report.has_updates = true;

        let preview = match self.build_preview(&fetched.content).await {
            Ok(preview) => preview,
            Err(err) => {
                self.record(&mut report.errors, source_id, SyncAction::Sync, SyncOutcome::Failed, err.to_string())
                    .await;
                report.errors.push(err);
                return report;
            }
        };
        debug!(source_id, summary = %preview.summary(), "sync preview");
        report.preview = Some(preview);

        // Never silently overwrite local edits under Ask
        if strategy == ConflictStrategy::Ask
            && self.local_modifications(&mut report.errors, source_id).await
        {
            info!(source_id, "sync blocked by local modifications");
            self.record(
                &mut report.errors,
                source_id,
                SyncAction::Sync,
                SyncOutcome::Conflicts,
                "local modifications detected",
            )
            .await;
            report.errors.push(Error::LocalModifications {
                id: source_id.to_string(),
            });
            return report;
        }

        if options.dry_run {
            return report;
        }

        let preview_ref = report.preview.clone().unwrap_or_default();
        match self
            .applier
            .apply(source, &fetched.content, &preview_ref)
            .await
        {
            Ok(counts) => {
                report.applied = Some(counts);
                if let Err(err) = self
                    .state
                    .update(
                        source_id,
                        StatePatch::checksum(fetched.checksum.clone())
                            .with_local_modifications(false),
                    )
                    .await
                {
                    report.errors.push(err);
                }
                self.record(
                    &mut report.errors,
                    source_id,
                    SyncAction::Sync,
                    SyncOutcome::Success,
                    format!(
                        "applied {} class(es), {} property(ies)",
                        counts.classes, counts.properties
                    ),
                )
                .await;
                info!(source_id, "sync applied");
            }
            Err(err) => {
                self.record(&mut report.errors, source_id, SyncAction::Sync, SyncOutcome::Failed, err.to_string())
                    .await;
                report.errors.push(err);
            }
        }
        report
    }

    /// Fetch with linear backoff over transient failures
    async fn fetch_with_retry(
        &self,
        source: &SyncSource,
        timeout: Duration,
    ) -> std::result::Result<FetchedContent, FetchError> {
        let mut attempt: u32 = 1;
        loop {
            let outcome = match tokio::time::timeout(timeout, self.fetcher.fetch(source, timeout))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout {
                    ms: timeout.as_millis() as u64,
                }),
            };
            match outcome {
                Ok(fetched) => return Ok(fetched),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    warn!(
                        source = %source.id,
                        attempt,
                        error = %err,
                        "transient fetch failure, backing off"
                    );
                    tokio::time::sleep(self.retry.base_delay * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn checksum_matches(
        &self,
        errors: &mut Vec<Error>,
        source_id: &str,
        fetched: &FetchedContent,
    ) -> bool {
        let state = match self.state.get(source_id).await {
            Ok(state) => state,
            Err(err) => {
                errors.push(err);
                None
            }
        };
        let matched = state
            .and_then(|s| s.last_checksum)
            .is_some_and(|stored| stored == fetched.checksum);
        if matched {
            debug!(source_id, "checksum unchanged, skipping");
        }
        matched
    }

    async fn local_modifications(&self, errors: &mut Vec<Error>, source_id: &str) -> bool {
        match self.state.get(source_id).await {
            Ok(state) => state.is_some_and(|s| s.local_modifications),
            Err(err) => {
                errors.push(err);
                false
            }
        }
    }

    /// Name-only preview: parsed template names vs. the store's name lists
    async fn build_preview(&self, content: &str) -> Result<NameDiff> {
        let template = self
            .parser
            .parse(content)
            .map_err(|e| Error::import_failed(e.to_string()))?;

        let existing_properties = self.store.list_properties().await?;
        let existing_classes = self.store.list_classes().await?;

        let properties = name_diff(
            template.properties.iter().map(|p| p.name.as_str()),
            existing_properties.keys().map(String::as_str),
        );
        let classes = name_diff(
            template.classes.iter().map(|c| c.name.as_str()),
            existing_classes.keys().map(String::as_str),
        );

        let mut merged = properties;
        merged.added.extend(classes.added);
        merged.updated.extend(classes.updated);
        merged.removed.extend(classes.removed);
        Ok(merged)
    }

    async fn record(
        &self,
        errors: &mut Vec<Error>,
        source_id: &str,
        action: SyncAction,
        result: SyncOutcome,
        details: impl Into<String>,
    ) {
        if let Err(err) = self.state.record_event(source_id, action, result, details).await {
            errors.push(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::storage::MemoryStorage;
    use onto_backend::SourceType;
    use onto_test_utils::{FakeEntityStore, JsonParser, ScriptedFetcher};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TEMPLATE: &str = r#"{
        "properties": [{"name": "Email", "type": "text"}],
        "classes": [{"name": "Person"}]
    }"#;

    /// Applier that counts invocations and reports the preview's added names
    #[derive(Default)]
    struct CountingApplier {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SyncApplier for CountingApplier {
        async fn apply(
            &self,
            _source: &SyncSource,
            _content: &str,
            preview: &NameDiff,
        ) -> Result<AppliedCounts> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::import_failed("applier exploded"));
            }
            Ok(AppliedCounts {
                classes: 0,
                properties: preview.added.len(),
            })
        }
    }

    struct Fixture {
        engine: SyncEngine,
        fetcher: Arc<ScriptedFetcher>,
        applier: Arc<CountingApplier>,
    }

    fn fixture_with(applier: CountingApplier) -> Fixture {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let applier = Arc::new(applier);
        let mut engine = SyncEngine::new(
            fetcher.clone(),
            Arc::new(JsonParser),
            Arc::new(FakeEntityStore::new()),
            SyncStateStore::new(Arc::new(MemoryStorage::new())),
            applier.clone(),
        )
        .with_retry(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        });
        engine.register_source(SyncSource {
            id: "feed".to_string(),
            name: "Test feed".to_string(),
            location: "https://example.com/ontology.json".to_string(),
            source_type: SourceType::Url,
            default_strategy: ConflictStrategy::Ask,
        });
        Fixture {
            engine,
            fetcher,
            applier,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(CountingApplier::default())
    }

    #[tokio::test]
    async fn unknown_source_fails_fast_without_history() {
        let fx = fixture();
        let report = fx.engine.check_for_updates("nope").await;
        assert!(!report.has_updates);
        assert!(matches!(report.errors[0], Error::InvalidSource { .. }));
        // Nothing to record against: no state created
        assert_eq!(fx.engine.state().get("nope").await.unwrap(), None);
        assert_eq!(fx.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn check_reports_updates_and_records_event() {
        let fx = fixture();
        fx.fetcher.push_ok(TEMPLATE);

        let report = fx.engine.check_for_updates("feed").await;
        assert!(report.has_updates);
        assert!(report.errors.is_empty());
        let preview = report.preview.unwrap();
        assert_eq!(preview.added, ["email", "person"]);

        let state = fx.engine.state().get("feed").await.unwrap().unwrap();
        assert_eq!(state.sync_history.len(), 1);
        assert_eq!(state.sync_history[0].action, SyncAction::Check);
        assert_eq!(state.sync_history[0].result, SyncOutcome::Success);
        // A check never advances the sync timestamp
        assert_eq!(state.last_synced_at, None);
    }

    #[tokio::test]
    async fn sync_applies_and_persists_checksum() {
        let fx = fixture();
        fx.fetcher.push_ok(TEMPLATE);

        let report = fx.engine.sync("feed", None, SyncOptions::default()).await;
        assert!(report.has_updates, "errors: {:?}", report.errors);
        assert!(report.errors.is_empty());
        assert_eq!(fx.applier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.applied.unwrap().properties, 2);

        let state = fx.engine.state().get("feed").await.unwrap().unwrap();
        assert!(state.last_checksum.is_some());
        assert!(state.last_synced_at.is_some());
        assert!(!state.local_modifications);
        assert_eq!(state.sync_history[0].action, SyncAction::Sync);
        assert_eq!(state.sync_history[0].result, SyncOutcome::Success);
    }

    #[tokio::test]
    async fn second_sync_with_identical_content_is_gated() {
        let fx = fixture();
        fx.fetcher.push_ok(TEMPLATE);

        let first = fx.engine.sync("feed", None, SyncOptions::default()).await;
        assert!(first.has_updates);

        // Fetcher repeats its last response: identical content
        let second = fx.engine.sync("feed", None, SyncOptions::default()).await;
        assert!(!second.has_updates);
        assert!(second.preview.is_none());
        // Apply ran exactly once
        assert_eq!(fx.applier.calls.load(Ordering::SeqCst), 1);

        let state = fx.engine.state().get("feed").await.unwrap().unwrap();
        assert_eq!(state.sync_history[0].details, "no updates");
    }

    #[tokio::test]
    async fn transient_failures_consume_retry_budget_then_succeed() {
        let fx = fixture();
        fx.fetcher.push_err(FetchError::Network {
            message: "reset".to_string(),
        });
        fx.fetcher.push_err(FetchError::Timeout { ms: 10 });
        fx.fetcher.push_ok(TEMPLATE);

        let report = fx.engine.check_for_updates("feed").await;
        assert!(report.has_updates);
        assert_eq!(fx.fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn permanent_failure_aborts_without_retrying() {
        let fx = fixture();
        fx.fetcher.push_err(FetchError::NotFound {
            source: "feed".to_string(),
        });
        fx.fetcher.push_ok(TEMPLATE);

        let report = fx.engine.sync("feed", None, SyncOptions::default()).await;
        assert!(!report.has_updates);
        assert!(matches!(
            report.errors[0],
            Error::Fetch(FetchError::NotFound { .. })
        ));
        assert_eq!(fx.fetcher.calls(), 1);

        let state = fx.engine.state().get("feed").await.unwrap().unwrap();
        assert_eq!(state.sync_history[0].result, SyncOutcome::Failed);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_last_error() {
        let fx = fixture();
        for _ in 0..3 {
            fx.fetcher.push_err(FetchError::Network {
                message: "reset".to_string(),
            });
        }
        fx.fetcher.push_ok(TEMPLATE);

        let report = fx.engine.sync("feed", None, SyncOptions::default()).await;
        assert!(!report.has_updates);
        assert_eq!(fx.fetcher.calls(), 3);
        assert!(matches!(
            report.errors[0],
            Error::Fetch(FetchError::Network { .. })
        ));
    }

    #[tokio::test]
    async fn local_modifications_block_ask_syncs() {
        let fx = fixture();
        fx.fetcher.push_ok(TEMPLATE);
        fx.engine
            .state()
            .update("feed", StatePatch::default().with_local_modifications(true))
            .await
            .unwrap();

        let report = fx.engine.sync("feed", None, SyncOptions::default()).await;
        assert!(report.has_updates);
        assert!(report.preview.is_some());
        assert!(
            report
                .errors
                .iter()
                .any(|e| matches!(e, Error::LocalModifications { .. }))
        );
        assert_eq!(fx.applier.calls.load(Ordering::SeqCst), 0);

        let state = fx.engine.state().get("feed").await.unwrap().unwrap();
        assert_eq!(state.sync_history[0].result, SyncOutcome::Conflicts);
        // The flag survives: only a successful sync clears it
        assert!(state.local_modifications);
    }

    #[tokio::test]
    async fn overwrite_strategy_ignores_local_modifications() {
        let fx = fixture();
        fx.fetcher.push_ok(TEMPLATE);
        fx.engine
            .state()
            .update("feed", StatePatch::default().with_local_modifications(true))
            .await
            .unwrap();

        let report = fx
            .engine
            .sync("feed", Some(ConflictStrategy::Overwrite), SyncOptions::default())
            .await;
        assert!(report.errors.is_empty());
        assert_eq!(fx.applier.calls.load(Ordering::SeqCst), 1);
        let state = fx.engine.state().get("feed").await.unwrap().unwrap();
        assert!(!state.local_modifications);
    }

    #[tokio::test]
    async fn dry_run_previews_without_touching_state() {
        let fx = fixture();
        fx.fetcher.push_ok(TEMPLATE);

        let options = SyncOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = fx.engine.sync("feed", None, options).await;
        assert!(report.has_updates);
        assert!(report.preview.is_some());
        assert!(report.applied.is_none());
        assert_eq!(fx.applier.calls.load(Ordering::SeqCst), 0);

        // No state was created at all: dry run leaves no trace
        assert_eq!(fx.engine.state().get("feed").await.unwrap(), None);
    }

    #[tokio::test]
    async fn apply_failure_records_failed_event_and_keeps_checksum_stale() {
        let fx = fixture_with(CountingApplier {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        fx.fetcher.push_ok(TEMPLATE);

        let report = fx.engine.sync("feed", None, SyncOptions::default()).await;
        assert!(report.has_updates);
        assert!(report.applied.is_none());
        assert!(!report.errors.is_empty());

        let state = fx.engine.state().get("feed").await.unwrap().unwrap();
        assert_eq!(state.sync_history[0].result, SyncOutcome::Failed);
        // Checksum not advanced: the next sync retries the same content
        assert_eq!(state.last_checksum, None);
    }

    #[tokio::test]
    async fn unparsable_remote_content_fails_soft() {
        let fx = fixture();
        fx.fetcher.push_ok("definitely { not json");

        let report = fx.engine.sync("feed", None, SyncOptions::default()).await;
        assert!(report.has_updates);
        assert!(report.preview.is_none());
        assert!(matches!(report.errors[0], Error::ImportFailed { .. }));
        assert_eq!(fx.applier.calls.load(Ordering::SeqCst), 0);
    }
}
