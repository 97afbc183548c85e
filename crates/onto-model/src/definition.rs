//! Property and class definition schema
//!
//! These are the two entity kinds an ontology is made of. Field names on
//! the wire follow the portable template format (`type`, `cardinality`,
//! `parent`, ...); the diff engine reports changed fields under the same
//! names.

use serde::{Deserialize, Serialize};

/// Value type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    Text,
    Number,
    Date,
    DateTime,
    Boolean,
    Url,
    /// Reference to a page entity in the store
    #[serde(rename = "page-reference")]
    PageRef,
    /// Reference to a node/block entity in the store
    #[serde(rename = "node-reference")]
    NodeRef,
}

/// How many values a property holds per entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    One,
    Many,
}

/// Which kind of entity a report item refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Property,
    Class,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Property => write!(f, "property"),
            EntityKind::Class => write!(f, "class"),
        }
    }
}

/// A named, typed schema field
///
/// `name` is the comparison key. The backing store canonicalizes names on
/// write (lowercase, whitespace folded to `-`), so comparisons go through
/// [`crate::normalize_name`] rather than raw equality.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub prop_type: PropertyType,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hide: bool,
    /// Names of classes this property is offered on
    #[serde(default)]
    pub classes: Vec<String>,
}

impl PropertyDefinition {
    /// Create a minimal property definition with defaults for everything
    /// but name and type
    pub fn new(name: impl Into<String>, prop_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            prop_type,
            cardinality: Cardinality::One,
            description: None,
            title: None,
            hide: false,
            classes: Vec::new(),
        }
    }
}

/// A named category with optional single-parent inheritance
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClassDefinition {
    pub name: String,
    /// Name of the parent class, if any. Must not equal `name`.
    #[serde(default)]
    pub parent: Option<String>,
    /// Ordered list of property names offered on instances of this class
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl ClassDefinition {
    /// Create a minimal class definition with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            properties: Vec::new(),
            description: None,
            icon: None,
        }
    }
}
