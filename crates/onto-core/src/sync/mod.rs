//! Per-source synchronization
//!
//! Wraps the diff/apply skeleton of the import path with checksum-gated
//! skip logic, bounded retry, and persisted sync state.

mod engine;

pub use engine::{
    CheckReport, DEFAULT_FETCH_TIMEOUT, RetryPolicy, SyncApplier, SyncEngine, SyncOptions,
    SyncReport,
};
