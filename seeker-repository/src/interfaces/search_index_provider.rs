//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search transport operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use serde_json::Value;

use seeker_shared::Document;

use crate::errors::SearchIndexError;
use crate::types::BatchOperationSummary;

/// Abstracts the underlying search engine (OpenSearch, Elasticsearch, etc.).
///
/// Every operation is addressed by index name and document type name; the
/// connection identifier selects which provider is used (see `Connections`).
/// Implementations are injected into `SearchIndexService` so tests can swap in
/// a mock.
///
/// # Note on Document Creation
///
/// There is no separate `create_document` function. `bulk_upsert` indexes each
/// document under its id, replacing any previous version, so reindexing a
/// record is always safe.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Check whether a mapping for `doc_type` exists in `index`.
    async fn mapping_exists(&self, index: &str, doc_type: &str) -> Result<bool, SearchIndexError>;

    /// Create (or extend) the mapping for `doc_type` in `index`.
    ///
    /// # Arguments
    ///
    /// * `mapping` - The mapping body, `{"properties": {..}}`
    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        mapping: &Value,
    ) -> Result<(), SearchIndexError>;

    /// Delete the mapping for `doc_type` and every document stored under it.
    ///
    /// Deleting a mapping that does not exist is not an error.
    async fn delete_mapping(&self, index: &str, doc_type: &str) -> Result<(), SearchIndexError>;

    /// Flush `index` so deletions and writes are persisted.
    async fn flush(&self, index: &str) -> Result<(), SearchIndexError>;

    /// Index many documents of one document type in a single request.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document outcome; partial failures are reported here
    /// * `Err(SearchIndexError)` - If the bulk request failed entirely
    async fn bulk_upsert(
        &self,
        index: &str,
        doc_type: &str,
        documents: &[Document],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Delete many documents of one document type by id.
    ///
    /// Documents that don't exist are considered successful deletions.
    async fn bulk_delete(
        &self,
        index: &str,
        doc_type: &str,
        ids: &[String],
    ) -> Result<BatchOperationSummary, SearchIndexError>;
}
