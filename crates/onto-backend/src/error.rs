//! Error types for onto-backend

use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A batch session is already pending or executing.
    ///
    /// Raised synchronously from `begin`: starting a second concurrent
    /// batch is a programmer error, not a runtime condition.
    #[error("Batch already in progress (id {id})")]
    BatchInProgress { id: Uuid },

    /// `add` or `execute` called with no batch begun
    #[error("No batch in progress")]
    NoActiveBatch,

    /// A single entity-store call failed
    #[error("Entity store error: {message}")]
    Store { message: String },

    /// The template parser rejected the document
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// A definition failed structural validation
    #[error(transparent)]
    Validation(#[from] onto_model::Error),
}

impl Error {
    /// Wrap an arbitrary store-side failure message
    pub fn store(message: impl Into<String>) -> Self {
        Error::Store {
            message: message.into(),
        }
    }

    /// Wrap an arbitrary parser failure message
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
        }
    }
}

/// Failure from a [`crate::StateStorage`] backend
///
/// Storage backends are foreign code; all the core needs is the message,
/// which the sync state layer preserves when re-wrapping.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}
