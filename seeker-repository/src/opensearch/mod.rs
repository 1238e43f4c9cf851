//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend.

mod index_config;
mod provider;

pub use index_config::{index_pattern, physical_index_name, IndexConfig, INDEX_SEPARATOR};
pub use provider::OpenSearchProvider;
