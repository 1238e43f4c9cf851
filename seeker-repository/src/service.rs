//! Search index service implementation.
//!
//! This module provides the per-connection service that the indexing pipeline
//! talks to. It validates names, ids and batch sizes before delegating to a
//! `SearchIndexProvider`.

use std::sync::Arc;

use seeker_shared::{Document, FieldSchema};

use crate::config::SearchIndexServiceConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::INDEX_SEPARATOR;
use crate::types::BatchOperationSummary;

/// Characters OpenSearch rejects in index names.
const INVALID_NAME_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// The high-level API for one search connection.
///
/// # Example
///
/// ```no_run
/// use seeker_repository::opensearch::{IndexConfig, OpenSearchProvider};
/// use seeker_repository::SearchIndexService;
/// use seeker_shared::{FieldSchema, FieldType};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::default()).await?;
/// let service = SearchIndexService::new(Box::new(provider));
///
/// let schema = FieldSchema::new().with("title", FieldType::text_with_raw());
/// if !service.mapping_exists("seeker", "article").await? {
///     service.put_mapping("seeker", "article", &schema).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct SearchIndexService {
    provider: Arc<dyn SearchIndexProvider>,
    config: SearchIndexServiceConfig,
}

impl SearchIndexService {
    /// Create a new SearchIndexService with default configuration.
    ///
    /// The default configuration includes a batch size limit of 1000 documents.
    pub fn new(provider: Box<dyn SearchIndexProvider>) -> Self {
        Self {
            provider: Arc::from(provider),
            config: SearchIndexServiceConfig::default(),
        }
    }

    /// Create a new SearchIndexService with custom configuration.
    pub fn with_config(
        provider: Box<dyn SearchIndexProvider>,
        config: SearchIndexServiceConfig,
    ) -> Self {
        Self {
            provider: Arc::from(provider),
            config,
        }
    }

    /// Create a service around a provider that is shared with other code,
    /// typically a test double whose recorded calls are inspected afterwards.
    pub fn from_shared(
        provider: Arc<dyn SearchIndexProvider>,
        config: SearchIndexServiceConfig,
    ) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &SearchIndexServiceConfig {
        &self.config
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Validate an index or document type name.
    fn validate_name(field_name: &str, value: &str) -> Result<(), SearchIndexError> {
        if value.is_empty() {
            return Err(SearchIndexError::validation(format!(
                "{} is required",
                field_name
            )));
        }
        if value.starts_with(['-', '_', '+']) {
            return Err(SearchIndexError::validation(format!(
                "{} '{}' must not start with '-', '_' or '+'",
                field_name, value
            )));
        }
        if value.contains(INDEX_SEPARATOR) {
            return Err(SearchIndexError::validation(format!(
                "{} '{}' must not contain '{}'",
                field_name, value, INDEX_SEPARATOR
            )));
        }
        if value.chars().any(|c| c.is_uppercase() || INVALID_NAME_CHARS.contains(&c)) {
            return Err(SearchIndexError::validation(format!(
                "{} '{}' must be lowercase and must not contain any of {:?}",
                field_name, value, INVALID_NAME_CHARS
            )));
        }
        Ok(())
    }

    fn validate_target(index: &str, doc_type: &str) -> Result<(), SearchIndexError> {
        Self::validate_name("index", index)?;
        Self::validate_name("doc_type", doc_type)
    }

    /// Check whether the document type has a mapping in `index`.
    pub async fn mapping_exists(&self, index: &str, doc_type: &str) -> Result<bool, SearchIndexError> {
        Self::validate_target(index, doc_type)?;
        self.provider.mapping_exists(index, doc_type).await
    }

    /// Create or extend the document type's mapping from its field schema.
    pub async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        schema: &FieldSchema,
    ) -> Result<(), SearchIndexError> {
        Self::validate_target(index, doc_type)?;
        self.provider
            .put_mapping(index, doc_type, &schema.to_mapping())
            .await
    }

    /// Delete the document type's mapping and documents.
    pub async fn delete_mapping(&self, index: &str, doc_type: &str) -> Result<(), SearchIndexError> {
        Self::validate_target(index, doc_type)?;
        self.provider.delete_mapping(index, doc_type).await
    }

    /// Flush `index`.
    pub async fn flush(&self, index: &str) -> Result<(), SearchIndexError> {
        Self::validate_name("index", index)?;
        self.provider.flush(index).await
    }

    /// Index documents of one document type in bulk.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document results; rejected documents don't fail the call
    /// * `Err(SearchIndexError::BatchSizeExceeded)` - If the batch exceeds the configured maximum
    /// * `Err(SearchIndexError::ValidationError)` - If a name or document id is invalid
    pub async fn bulk_upsert(
        &self,
        index: &str,
        doc_type: &str,
        documents: &[Document],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        Self::validate_target(index, doc_type)?;
        self.validate_batch_size(documents.len())?;

        if let Some(position) = documents.iter().position(|doc| doc.id.is_empty()) {
            return Err(SearchIndexError::validation(format!(
                "Document at position {} has an empty id",
                position
            )));
        }

        self.provider.bulk_upsert(index, doc_type, documents).await
    }

    /// Delete documents of one document type in bulk.
    pub async fn bulk_delete(
        &self,
        index: &str,
        doc_type: &str,
        ids: &[String],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if ids.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        Self::validate_target(index, doc_type)?;
        self.validate_batch_size(ids.len())?;

        if ids.iter().any(|id| id.is_empty()) {
            return Err(SearchIndexError::validation("Document ids cannot be empty"));
        }

        self.provider.bulk_delete(index, doc_type, ids).await
    }
}
