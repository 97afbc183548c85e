//! Shared test fixtures for the ontology-manager workspace
//!
//! This crate provides standardised in-memory fakes to eliminate
//! duplication across crate test suites. It is a dev-dependency only —
//! never published.
//!
//! - [`FakeEntityStore`] — entity store with scriptable per-name failures
//!   and a call log
//! - [`ScriptedFetcher`] — fetcher replaying a queue of canned responses
//! - [`JsonParser`] — template parser over plain JSON documents

mod fetcher;
mod parser;
mod store;

pub use fetcher::ScriptedFetcher;
pub use parser::JsonParser;
pub use store::FakeEntityStore;
