//! Error types for onto-core

use onto_backend::FetchError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the import and sync flows
///
/// These appear as fields on returned result objects rather than being
/// thrown: callers should never need to wrap `import()`/`sync()` in
/// error handling for the documented taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The conflict gate blocked an import under the `Ask` strategy
    #[error("Unresolved conflicts: {count} change(s) require manual review")]
    UnresolvedConflicts { count: usize },

    /// Sync requested for a source id that was never registered
    #[error("Unknown sync source: {id}")]
    InvalidSource { id: String },

    /// The target was edited locally since the last successful sync
    #[error("Local modifications detected for source {id}; not overwriting")]
    LocalModifications { id: String },

    /// Parsing or validating the document failed
    #[error("Import failed: {message}")]
    ImportFailed { message: String },

    /// One operation within an apply batch failed
    #[error("Apply failed for {item} (operation {index}): {message}")]
    Apply {
        index: usize,
        item: String,
        message: String,
    },

    /// Sync state storage failed; the original message is preserved
    /// because state corruption is not locally recoverable
    #[error("Sync state storage error: {message}")]
    State { message: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Backend(#[from] onto_backend::Error),

    #[error(transparent)]
    Validation(#[from] onto_model::Error),
}

impl Error {
    pub fn import_failed(message: impl Into<String>) -> Self {
        Error::ImportFailed {
            message: message.into(),
        }
    }

    pub(crate) fn state(err: onto_backend::StorageError) -> Self {
        Error::State {
            message: err.message,
        }
    }
}
