//! Data model for the ontology manager
//!
//! This crate defines the typed schema vocabulary shared by every layer
//! above it:
//!
//! - **Definitions**: [`PropertyDefinition`] and [`ClassDefinition`], the
//!   two entity kinds an ontology is made of
//! - **Template**: [`ParsedTemplate`], a portable ontology as produced by
//!   an external parser, prior to reconciliation
//! - **Snapshot**: [`ExistingOntology`], a point-in-time view of what the
//!   target store currently holds
//! - **Normalization**: [`normalize_name`], the canonical name folding the
//!   backing store applies on write
//! - **Checksum**: [`checksum`], the content digest used for drift
//!   detection without re-parsing
//!
//! The crate is a leaf: pure data and pure functions, no I/O, no async.

pub mod checksum;
pub mod definition;
pub mod error;
pub mod normalize;
pub mod ontology;
pub mod template;
pub mod validation;

pub use checksum::checksum;
pub use definition::{Cardinality, ClassDefinition, EntityKind, PropertyDefinition, PropertyType};
pub use error::{Error, Result};
pub use normalize::normalize_name;
pub use ontology::ExistingOntology;
pub use template::ParsedTemplate;
pub use validation::{validate_class, validate_property, validate_template};
