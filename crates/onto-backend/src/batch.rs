//! Ordered, non-atomic batch application
//!
//! A batch is a list of create/update/delete operations executed strictly
//! in order, one at a time. Later operations may depend on earlier ones
//! (a class referencing a property created earlier in the same batch), so
//! the applier never parallelizes.
//!
//! The target store offers no multi-operation transaction, and the
//! applier does not pretend otherwise: a failed operation is recorded and
//! the batch continues. `BatchResult::applied_items` lists what was
//! durably applied so a caller can attempt manual compensating deletes.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use onto_model::{ClassDefinition, PropertyDefinition};

use crate::error::{Error, Result};
use crate::traits::EntityStore;

/// Progress callback signature: invoked after every operation
pub type ProgressFn = dyn Fn(BatchProgress) + Send + Sync;

/// One schema mutation against the entity store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum BatchOperation {
    CreateProperty(PropertyDefinition),
    UpdateProperty(PropertyDefinition),
    DeleteProperty(String),
    CreateClass(ClassDefinition),
    UpdateClass(ClassDefinition),
    DeleteClass(String),
}

impl BatchOperation {
    /// Name of the entity this operation touches
    pub fn name(&self) -> &str {
        match self {
            BatchOperation::CreateProperty(def) | BatchOperation::UpdateProperty(def) => &def.name,
            BatchOperation::CreateClass(def) | BatchOperation::UpdateClass(def) => &def.name,
            BatchOperation::DeleteProperty(name) | BatchOperation::DeleteClass(name) => name,
        }
    }

    pub fn describe(&self) -> String {
        let verb = match self {
            BatchOperation::CreateProperty(_) => "create property",
            BatchOperation::UpdateProperty(_) => "update property",
            BatchOperation::DeleteProperty(_) => "delete property",
            BatchOperation::CreateClass(_) => "create class",
            BatchOperation::UpdateClass(_) => "update class",
            BatchOperation::DeleteClass(_) => "delete class",
        };
        format!("{verb} {:?}", self.name())
    }
}

/// Progress after one operation completed (success or failure)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Operations finished so far (1-based)
    pub current: usize,
    pub total: usize,
    pub percentage: u8,
}

impl BatchProgress {
    fn at(current: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            ((current * 100) / total) as u8
        };
        Self {
            current,
            total,
            percentage,
        }
    }
}

/// A single failed operation within a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Position of the failed operation in the batch (0-based)
    pub index: usize,
    /// Entity name the operation touched
    pub item: String,
    pub message: String,
}

/// Aggregate outcome of a batch
///
/// Invariants: `succeeded + failed == total` and
/// `applied_items.len() == succeeded`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<BatchError>,
    /// Names durably applied, in execution order, for manual cleanup
    pub applied_items: Vec<String>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Execute a list of operations strictly in order
///
/// Each operation's failure is isolated: it is recorded in the result and
/// the batch continues with the next operation. The progress callback
/// fires after every operation regardless of outcome.
pub async fn apply_batch(
    store: &dyn EntityStore,
    operations: &[BatchOperation],
    // Written out instead of `&ProgressFn`: the alias pins the trait-object
    // lifetime to 'static, which would reject borrowed callbacks.
    on_progress: Option<&(dyn Fn(BatchProgress) + Send + Sync + '_)>,
) -> BatchResult {
    let total = operations.len();
    let mut result = BatchResult {
        total,
        ..Default::default()
    };

    for (index, op) in operations.iter().enumerate() {
        let outcome = dispatch(store, op).await;
        match outcome {
            Ok(()) => {
                result.succeeded += 1;
                result.applied_items.push(op.name().to_string());
                debug!(op = %op.describe(), index, "batch operation applied");
            }
            Err(err) => {
                result.failed += 1;
                warn!(op = %op.describe(), index, error = %err, "batch operation failed");
                result.errors.push(BatchError {
                    index,
                    item: op.name().to_string(),
                    message: err.to_string(),
                });
            }
        }
        if let Some(callback) = on_progress {
            callback(BatchProgress::at(index + 1, total));
        }
    }

    result
}

async fn dispatch(store: &dyn EntityStore, op: &BatchOperation) -> Result<()> {
    match op {
        BatchOperation::CreateProperty(def) => store.create_property(def).await,
        BatchOperation::UpdateProperty(def) => store.update_property(def).await,
        BatchOperation::DeleteProperty(name) => store.delete_property(name).await,
        BatchOperation::CreateClass(def) => store.create_class(def).await,
        BatchOperation::UpdateClass(def) => store.update_class(def).await,
        BatchOperation::DeleteClass(name) => store.delete_class(name).await,
    }
}

/// Lifecycle state of a batch session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Executing,
    Completed,
    /// At least one operation failed, even if others succeeded
    Failed,
}

/// Status query answer for the current or most recent session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    pub id: Uuid,
    pub operation_count: usize,
    pub status: BatchStatus,
}

struct Session {
    id: Uuid,
    operations: Vec<BatchOperation>,
    status: BatchStatus,
}

/// Session-based surface over [`apply_batch`]
///
/// Guards against overlapping sessions: a second `begin` while one is
/// pending or executing fails with [`Error::BatchInProgress`]. Misuse of
/// the session lifecycle (`add` without `begin`) is a programmer error
/// and fails synchronously.
pub struct BatchApplier {
    store: Arc<dyn EntityStore>,
    session: Option<Session>,
}

impl BatchApplier {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            session: None,
        }
    }

    /// Start a new batch session
    pub fn begin(&mut self) -> Result<Uuid> {
        if let Some(session) = &self.session
            && matches!(session.status, BatchStatus::Pending | BatchStatus::Executing)
        {
            return Err(Error::BatchInProgress { id: session.id });
        }
        let id = Uuid::new_v4();
        self.session = Some(Session {
            id,
            operations: Vec::new(),
            status: BatchStatus::Pending,
        });
        Ok(id)
    }

    /// Queue an operation on the pending session
    pub fn add(&mut self, op: BatchOperation) -> Result<()> {
        match &mut self.session {
            Some(session) if session.status == BatchStatus::Pending => {
                session.operations.push(op);
                Ok(())
            }
            _ => Err(Error::NoActiveBatch),
        }
    }

    /// Discard the pending session without applying anything
    pub fn cancel(&mut self) -> Result<()> {
        match &self.session {
            Some(session) if session.status == BatchStatus::Pending => {
                self.session = None;
                Ok(())
            }
            _ => Err(Error::NoActiveBatch),
        }
    }

    /// Status of the current or most recently executed session
    pub fn status(&self) -> Option<BatchInfo> {
        self.session.as_ref().map(|s| BatchInfo {
            id: s.id,
            operation_count: s.operations.len(),
            status: s.status,
        })
    }

    /// Apply the pending session's operations in order
    ///
    /// The session transitions to `Executing` for the duration, then to
    /// `Completed` or `Failed` (at least one operation failed). Either
    /// terminal state permits a subsequent `begin`.
    pub async fn execute(&mut self, on_progress: Option<&ProgressFn>) -> Result<BatchResult> {
        let session = match &mut self.session {
            Some(session) if session.status == BatchStatus::Pending => session,
            _ => return Err(Error::NoActiveBatch),
        };
        session.status = BatchStatus::Executing;
        let operations = std::mem::take(&mut session.operations);

        let result = apply_batch(self.store.as_ref(), &operations, on_progress).await;

        // Session survives for status queries; op list stays reported
        let session = self.session.as_mut().ok_or(Error::NoActiveBatch)?;
        session.operations = operations;
        session.status = if result.is_success() {
            BatchStatus::Completed
        } else {
            BatchStatus::Failed
        };
        Ok(result)
    }
}
