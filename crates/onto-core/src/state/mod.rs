//! Per-source sync state tracking
//!
//! The state store remembers, for each registered synchronization source,
//! what was last synchronized: the content checksum, the timestamp, a
//! bounded audit history, and whether the target was edited locally since.
//! Durability is pluggable behind [`onto_backend::StateStorage`] so the
//! sync logic never cares whether it runs over memory or disk.

pub mod storage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use onto_backend::StateStorage;

use crate::error::{Error, Result};

/// Default bound on the per-source history ring
pub const DEFAULT_HISTORY_CAP: usize = 100;

/// What kind of event a history entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Sync,
    Check,
    Rollback,
}

/// How the recorded event ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    Success,
    Failed,
    Conflicts,
}

/// One audit entry, newest-first in [`SyncState::sync_history`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: SyncAction,
    pub result: SyncOutcome,
    pub details: String,
}

/// Persisted record for one synchronization source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub source_id: String,
    /// Advanced only by a history entry with `action=sync, result=success`
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_checksum: Option<String>,
    /// Target edited since the last successful sync
    #[serde(default)]
    pub local_modifications: bool,
    /// Bounded ring of recent events, newest first
    #[serde(default)]
    pub sync_history: Vec<SyncHistoryEntry>,
}

impl SyncState {
    fn new(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            last_synced_at: None,
            last_checksum: None,
            local_modifications: false,
            sync_history: Vec::new(),
        }
    }
}

/// Partial update applied by [`SyncStateStore::update`]
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub last_checksum: Option<String>,
    pub local_modifications: Option<bool>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl StatePatch {
    pub fn checksum(checksum: impl Into<String>) -> Self {
        Self {
            last_checksum: Some(checksum.into()),
            ..Default::default()
        }
    }

    pub fn with_local_modifications(mut self, flag: bool) -> Self {
        self.local_modifications = Some(flag);
        self
    }
}

/// CRUD surface over the per-source sync state
///
/// States are created lazily on the first `update`/`record_event` for a
/// source and removed only by an explicit `clear`.
pub struct SyncStateStore {
    storage: Arc<dyn StateStorage>,
    history_cap: usize,
}

impl SyncStateStore {
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self {
            storage,
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }

    /// Override the history bound (testing, constrained hosts)
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    /// Read a source's state
    ///
    /// Storage may hold stale or foreign-written records; anything that
    /// fails to decode or has an empty/mismatched source id is treated as
    /// absent rather than surfaced as corrupt.
    pub async fn get(&self, source_id: &str) -> Result<Option<SyncState>> {
        let raw = self.storage.read(source_id).await.map_err(Error::state)?;
        let Some(doc) = raw else {
            return Ok(None);
        };
        match toml::from_str::<SyncState>(&doc) {
            Ok(state) if state.source_id == source_id => Ok(Some(state)),
            Ok(state) => {
                warn!(
                    source_id,
                    stored = %state.source_id,
                    "sync state record has mismatched source id, discarding"
                );
                Ok(None)
            }
            Err(err) => {
                warn!(source_id, error = %err, "undecodable sync state record, discarding");
                Ok(None)
            }
        }
    }

    /// Merge a partial update into a source's state, creating it if absent
    pub async fn update(&self, source_id: &str, patch: StatePatch) -> Result<()> {
        let mut state = self
            .get(source_id)
            .await?
            .unwrap_or_else(|| SyncState::new(source_id));

        if let Some(checksum) = patch.last_checksum {
            state.last_checksum = Some(checksum);
        }
        if let Some(flag) = patch.local_modifications {
            state.local_modifications = flag;
        }
        if let Some(ts) = patch.last_synced_at {
            state.last_synced_at = Some(ts);
        }
        state.source_id = source_id.to_string();

        self.persist(&state).await
    }

    /// Prepend a timestamped history entry, trimming to the cap
    ///
    /// A `sync`/`success` entry also advances `last_synced_at`.
    pub async fn record_event(
        &self,
        source_id: &str,
        action: SyncAction,
        result: SyncOutcome,
        details: impl Into<String>,
    ) -> Result<()> {
        let mut state = self
            .get(source_id)
            .await?
            .unwrap_or_else(|| SyncState::new(source_id));

        let entry = SyncHistoryEntry {
            timestamp: Utc::now(),
            action,
            result,
            details: details.into(),
        };
        if action == SyncAction::Sync && result == SyncOutcome::Success {
            state.last_synced_at = Some(entry.timestamp);
        }
        state.sync_history.insert(0, entry);
        state.sync_history.truncate(self.history_cap);

        debug!(source_id, ?action, ?result, "recorded sync event");
        self.persist(&state).await
    }

    /// Remove a source's state entirely
    pub async fn clear(&self, source_id: &str) -> Result<()> {
        self.storage.remove(source_id).await.map_err(Error::state)
    }

    /// Ids of every source with persisted state
    pub async fn list_source_ids(&self) -> Result<Vec<String>> {
        self.storage.keys().await.map_err(Error::state)
    }

    async fn persist(&self, state: &SyncState) -> Result<()> {
        let doc = toml::to_string_pretty(state).map_err(|e| Error::State {
            message: e.to_string(),
        })?;
        self.storage
            .write(&state.source_id, &doc)
            .await
            .map_err(Error::state)
    }
}
