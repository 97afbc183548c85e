//! Error types for onto-model

pub type Result<T> = std::result::Result<T, Error>;

/// Validation errors for ontology definitions
///
/// These are always surfaced to the caller and never retried: a malformed
/// definition stays malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Entity name is empty")]
    EmptyName,

    #[error("Entity name too long: {len} characters (max {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Entity name contains invalid characters: {name:?}")]
    InvalidNameCharacters { name: String },

    #[error("Class {name:?} cannot be its own parent")]
    SelfParent { name: String },

    #[error("Class {class:?} references empty property name")]
    EmptyPropertyReference { class: String },
}
