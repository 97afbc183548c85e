//! Orchestration layer for the ontology manager
//!
//! This crate coordinates the lower layers into the two user-facing
//! flows:
//!
//! - **Import**: parse → validate → diff → conflict gate → batch apply,
//!   with dry-run previews and honest partial-failure reporting
//!   ([`Importer`])
//! - **Sync**: per-source checksum-gated update detection with
//!   retry/backoff, a name-only preview, and persisted sync state
//!   ([`SyncEngine`], [`SyncStateStore`])
//!
//! # Architecture
//!
//! ```text
//!                 host UI / commands
//!                        |
//!                    onto-core
//!                        |
//!          +---------+---+------+
//!          |         |          |
//!      onto-diff onto-backend onto-model
//! ```
//!
//! Every collaborator (parser, entity store, fetcher, state storage) is
//! constructor-injected behind the traits in `onto-backend`; nothing in
//! this crate reaches for ambient host objects. The public entry points
//! (`import`, `sync`, `check_for_updates`) never propagate collaborator
//! errors — all documented failure modes resolve to fields on the
//! returned result objects.

pub mod error;
pub mod import;
pub mod progress;
pub mod state;
pub mod sync;

pub use error::{Error, Result};
pub use import::{AppliedCounts, ImportOptions, ImportResult, Importer};
pub use progress::{ImportPhase, ProgressFn, ProgressUpdate};
pub use state::storage::{FileStorage, MemoryStorage};
pub use state::{
    DEFAULT_HISTORY_CAP, StatePatch, SyncAction, SyncHistoryEntry, SyncOutcome, SyncState,
    SyncStateStore,
};
pub use sync::{CheckReport, RetryPolicy, SyncApplier, SyncEngine, SyncOptions, SyncReport};
