//! Legacy transaction vocabulary (deprecated)
//!
//! Older callers speak in begin/commit/rollback terms. The batch engine
//! is the single real implementation; this shim translates the old call
//! shapes one-to-one and adds no logic. New code should use
//! [`crate::BatchApplier`] directly.

#![allow(deprecated)]

use std::sync::Arc;
use uuid::Uuid;

use crate::batch::{BatchApplier, BatchInfo, BatchOperation, BatchResult, ProgressFn};
use crate::error::Result;
use crate::traits::EntityStore;

/// Compatibility wrapper exposing the legacy transaction surface
#[deprecated(note = "use BatchApplier; this shim only translates the old vocabulary")]
pub struct Transaction {
    inner: BatchApplier,
}

impl Transaction {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            inner: BatchApplier::new(store),
        }
    }

    /// Legacy name for [`BatchApplier::begin`]
    pub fn begin_transaction(&mut self) -> Result<Uuid> {
        self.inner.begin()
    }

    /// Legacy name for [`BatchApplier::add`]
    pub fn add_operation(&mut self, op: BatchOperation) -> Result<()> {
        self.inner.add(op)
    }

    /// Legacy name for [`BatchApplier::cancel`]
    pub fn rollback(&mut self) -> Result<()> {
        self.inner.cancel()
    }

    /// Legacy name for [`BatchApplier::execute`]
    ///
    /// Despite the name, this was never atomic: the underlying batch has
    /// per-operation failure isolation, exactly as the new surface does.
    pub async fn commit(&mut self, on_progress: Option<&ProgressFn>) -> Result<BatchResult> {
        self.inner.execute(on_progress).await
    }

    /// Legacy name for [`BatchApplier::status`]
    pub fn transaction_status(&self) -> Option<BatchInfo> {
        self.inner.status()
    }
}
