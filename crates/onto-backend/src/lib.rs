//! Collaborator interfaces and the batch applier
//!
//! The reconciliation core never touches a real document store, parser,
//! network fetcher, or durable storage directly. This crate defines the
//! seams those collaborators plug into:
//!
//! - [`EntityStore`] — per-entity create/update/delete plus snapshot
//!   queries; calls are individually atomic, nothing more
//! - [`TemplateParser`] — raw text to [`onto_model::ParsedTemplate`]
//! - [`ContentFetcher`] — remote content with a transient/permanent
//!   error classification consumed by the sync engine's retry loop
//! - [`StateStorage`] — string key/value persistence for sync state
//!
//! On top of the entity-store seam it implements the [`batch`] module:
//! an ordered, non-atomic applier with per-operation failure isolation,
//! and a deprecated [`transaction`] compatibility shim over it.

pub mod batch;
pub mod error;
pub mod fetch;
pub mod traits;
pub mod transaction;

pub use batch::{
    BatchApplier, BatchError, BatchInfo, BatchOperation, BatchProgress, BatchResult, BatchStatus,
    apply_batch,
};
pub use error::{Error, Result, StorageError};
pub use fetch::{ConflictStrategy, FetchError, FetchedContent, SourceType, SyncSource};
pub use traits::{ContentFetcher, EntityStore, StateStorage, TemplateParser};
