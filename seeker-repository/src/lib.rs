//! # Seeker Repository
//!
//! This crate provides the search-engine side of the seeker indexing
//! pipeline: the transport trait, a concrete OpenSearch implementation, the
//! validating per-connection service, and the named connection table.

pub mod config;
pub mod connections;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod service;
pub mod types;

pub use config::SearchIndexServiceConfig;
pub use connections::{Connections, DEFAULT_CONNECTION};
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::OpenSearchProvider;
pub use service::SearchIndexService;
pub use types::{BatchOperationResult, BatchOperationSummary};
