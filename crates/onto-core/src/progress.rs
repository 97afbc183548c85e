//! Import progress reporting

use serde::{Deserialize, Serialize};

/// Phase of the import pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPhase {
    Parsing,
    Validating,
    Comparing,
    Importing,
}

impl std::fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportPhase::Parsing => write!(f, "parsing"),
            ImportPhase::Validating => write!(f, "validating"),
            ImportPhase::Comparing => write!(f, "comparing"),
            ImportPhase::Importing => write!(f, "importing"),
        }
    }
}

/// One progress notification
///
/// During the first three phases `current`/`total` count phases; during
/// `Importing` they count batch operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub phase: ImportPhase,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Callback signature for progress notifications
pub type ProgressFn = dyn Fn(ProgressUpdate) + Send + Sync;
