//! Structural diff engine for ontology reconciliation
//!
//! Given a parsed template and a snapshot of the store's current schema,
//! the engine produces a [`ChangeSet`]: new definitions, updated
//! definitions with per-field change lists, and conflicts flagging updates
//! that touch fields considered unsafe to auto-apply.
//!
//! Two granularities exist on purpose:
//!
//! - [`diff`] — the full field-level comparison used by the import path,
//!   which has complete definitions on both sides
//! - [`name_diff`] — a lightweight name-only comparison used by the sync
//!   path, which often has only the remote document and the store's name
//!   list available
//!
//! Both share [`onto_model::normalize_name`], so they can never disagree
//! about entity identity. Diffing is pure computation: no I/O, no async,
//! and it never fails on well-typed input.

pub mod engine;
pub mod name_diff;
pub mod policy;
pub mod preview;

pub use engine::diff;
pub use name_diff::{NameDiff, name_diff};
pub use policy::ConflictPolicy;
pub use preview::{ChangeSet, ChangeSummary, Conflict, UpdateRecord};
