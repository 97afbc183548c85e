//! Sync sources and fetch results
//!
//! Types shared between the fetch collaborator and the sync engine. The
//! transient/permanent split on [`FetchError`] drives the retry loop:
//! transient failures consume retry budget, permanent ones abort
//! immediately.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a sync source's content comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Url,
    File,
    /// Content resolved by the host environment (plugin asset, embedded)
    Builtin,
}

/// How conflicting changes are handled during import or sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Block application entirely while conflicts exist (default)
    #[default]
    Ask,
    /// Apply everything, conflicts included
    Overwrite,
    /// Apply everything except conflicted updates
    Skip,
}

/// A registered synchronization source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSource {
    pub id: String,
    pub name: String,
    /// URL, path, or host-defined locator, depending on `source_type`
    pub location: String,
    pub source_type: SourceType,
    #[serde(default)]
    pub default_strategy: ConflictStrategy,
}

/// Payload returned by a successful fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedContent {
    pub content: String,
    /// SHA-256 hex digest of `content`
    pub checksum: String,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub etag: Option<String>,
}

impl FetchedContent {
    /// Build a fetch result, computing the checksum from the content
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let checksum = onto_model::checksum(&content);
        Self {
            content,
            checksum,
            last_modified: None,
            etag: None,
        }
    }
}

/// Fetch collaborator failure
// Manual Display/Error impls: the `source` field is a locator string, and
// the thiserror derive would treat any field with that name as the error's
// `source()`, which requires it to be an error type.
#[derive(Debug, Clone)]
pub enum FetchError {
    NotFound { source: String },

    InvalidSource { message: String },

    Timeout { ms: u64 },

    Network { message: String },

    Io { message: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NotFound { source } => write!(f, "Source not found: {source}"),
            FetchError::InvalidSource { message } => write!(f, "Invalid source: {message}"),
            FetchError::Timeout { ms } => write!(f, "Fetch timed out after {ms} ms"),
            FetchError::Network { message } => write!(f, "Network error: {message}"),
            FetchError::Io { message } => write!(f, "I/O error: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Whether the retry loop may try again
    ///
    /// `NotFound` and `InvalidSource` are permanent: retrying cannot make
    /// a missing or malformed source appear.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout { .. } | FetchError::Network { .. } | FetchError::Io { .. }
        )
    }
}
