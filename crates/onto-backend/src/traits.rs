//! Collaborator interface contracts
//!
//! Everything the reconciliation core consumes is injected behind one of
//! these traits, never reached through an ambient global. Production
//! implementations wrap the host environment; tests substitute in-memory
//! fakes.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use onto_model::{ClassDefinition, ParsedTemplate, PropertyDefinition};

use crate::error::{Result, StorageError};
use crate::fetch::{FetchError, FetchedContent, SyncSource};

/// The host document store's schema surface
///
/// Each call is individually atomic; there is no cross-call transaction.
/// Success is signaled by the absence of an error — implementations in
/// some host environments return nothing useful on success, so no payload
/// is modeled here.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create_property(&self, def: &PropertyDefinition) -> Result<()>;
    async fn update_property(&self, def: &PropertyDefinition) -> Result<()>;
    async fn delete_property(&self, name: &str) -> Result<()>;

    async fn create_class(&self, def: &ClassDefinition) -> Result<()>;
    async fn update_class(&self, def: &ClassDefinition) -> Result<()>;
    async fn delete_class(&self, name: &str) -> Result<()>;

    /// Name-keyed snapshot of all stored properties
    async fn list_properties(&self) -> Result<BTreeMap<String, PropertyDefinition>>;
    /// Name-keyed snapshot of all stored classes
    async fn list_classes(&self) -> Result<BTreeMap<String, ClassDefinition>>;
}

/// The external document parser
///
/// Parsing and validation are synchronous computation; failures of either
/// kind surface to callers as a single parse-error class.
pub trait TemplateParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<ParsedTemplate>;
    fn validate(&self, template: &ParsedTemplate) -> Result<()>;
}

/// The network/file fetch layer
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch a source's current content, bounded by `timeout`
    async fn fetch(
        &self,
        source: &SyncSource,
        timeout: Duration,
    ) -> std::result::Result<FetchedContent, FetchError>;
}

/// Durable key/value storage for sync state
///
/// Values are opaque serialized documents; the sync state layer owns the
/// encoding. Keys are source ids.
#[async_trait]
pub trait StateStorage: Send + Sync {
    async fn read(&self, key: &str) -> std::result::Result<Option<String>, StorageError>;
    async fn write(&self, key: &str, value: &str) -> std::result::Result<(), StorageError>;
    async fn remove(&self, key: &str) -> std::result::Result<(), StorageError>;
    async fn keys(&self) -> std::result::Result<Vec<String>, StorageError>;
}
