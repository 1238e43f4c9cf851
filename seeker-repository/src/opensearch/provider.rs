//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{
        IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesFlushParts,
        IndicesPutMappingParts,
    },
    BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use seeker_shared::Document;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{index_pattern, physical_index_name, IndexConfig};
use crate::types::{BatchOperationResult, BatchOperationSummary};

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// use seeker_repository::opensearch::{IndexConfig, OpenSearchProvider};
///
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::default()).await?;
/// provider.bulk_upsert("seeker", "article", &documents).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - Settings used when document type indices are created
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            shards = index_config.number_of_shards,
            replicas = index_config.number_of_replicas,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Turn a bulk response body into per-document results.
    ///
    /// `items` in the response are in request order, so the n-th item belongs
    /// to the n-th id. For deletes a 404 counts as success.
    fn summarize_bulk_response(action: &str, ids: &[String], body: &Value) -> BatchOperationSummary {
        let empty = Vec::new();
        let items = body
            .get("items")
            .and_then(|items| items.as_array())
            .unwrap_or(&empty);

        let results = ids
            .iter()
            .enumerate()
            .map(|(position, id)| {
                let item = items.get(position).and_then(|item| item.get(action));
                let Some(item) = item else {
                    return BatchOperationResult::failed(
                        id.clone(),
                        SearchIndexError::parse(format!("Missing bulk response item for {}", id)),
                    );
                };

                let status = item.get("status").and_then(|s| s.as_u64()).unwrap_or(0);
                match item.get("error") {
                    None => BatchOperationResult::succeeded(id.clone()),
                    Some(_) if action == "delete" && status == 404 => {
                        BatchOperationResult::succeeded(id.clone())
                    }
                    Some(err) => {
                        let reason = err
                            .get("reason")
                            .and_then(|r| r.as_str())
                            .map(str::to_string)
                            .unwrap_or_else(|| err.to_string());
                        let message = format!("status {}: {}", status, reason);
                        let error = match action {
                            "delete" => SearchIndexError::delete(message),
                            _ => SearchIndexError::bulk_index(message),
                        };
                        BatchOperationResult::failed(id.clone(), error)
                    }
                }
            })
            .collect();

        BatchOperationSummary::from_results(results)
    }

    async fn send_bulk(
        &self,
        action: &str,
        physical: &str,
        ids: Vec<String>,
        body: Vec<JsonBody<Value>>,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let response = self
            .client
            .bulk(BulkParts::Index(physical))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, index = %physical, "Bulk request failed");
            return Err(SearchIndexError::bulk_index(format!(
                "Bulk {} failed with status {}: {}",
                action, status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = Self::summarize_bulk_response(action, &ids, &response_body);
        if summary.failed > 0 {
            warn!(
                index = %physical,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Bulk {} completed with some failures",
                action
            );
        } else {
            debug!(index = %physical, count = summary.succeeded, "Bulk {} completed", action);
        }
        Ok(summary)
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn mapping_exists(&self, index: &str, doc_type: &str) -> Result<bool, SearchIndexError> {
        let physical = physical_index_name(index, doc_type);
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&physical]))
            .send()
            .await
            .map_err(|e| SearchIndexError::mapping(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(SearchIndexError::mapping(format!(
                "Unexpected status {} checking index {}",
                status, physical
            ))),
        }
    }

    /// Creates the physical index with the configured settings when it does
    /// not exist yet, otherwise extends the existing mapping.
    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        mapping: &Value,
    ) -> Result<(), SearchIndexError> {
        let physical = physical_index_name(index, doc_type);

        let response = if self.mapping_exists(index, doc_type).await? {
            self.client
                .indices()
                .put_mapping(IndicesPutMappingParts::Index(&[&physical]))
                .body(mapping.clone())
                .send()
                .await
        } else {
            self.client
                .indices()
                .create(IndicesCreateParts::Index(&physical))
                .body(self.index_config.create_body(mapping))
                .send()
                .await
        }
        .map_err(|e| SearchIndexError::mapping(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, index = %physical, "Put mapping failed");
            return Err(SearchIndexError::mapping(format!(
                "Put mapping failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %physical, "Mapping ready");
        Ok(())
    }

    async fn delete_mapping(&self, index: &str, doc_type: &str) -> Result<(), SearchIndexError> {
        let physical = physical_index_name(index, doc_type);
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[&physical]))
            .send()
            .await
            .map_err(|e| SearchIndexError::mapping(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - the document type may never have been indexed
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, index = %physical, "Delete mapping failed");
            return Err(SearchIndexError::mapping(format!(
                "Delete mapping failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %physical, "Mapping deleted");
        Ok(())
    }

    async fn flush(&self, index: &str) -> Result<(), SearchIndexError> {
        let pattern = index_pattern(index);
        let response = self
            .client
            .indices()
            .flush(IndicesFlushParts::Index(&[&pattern]))
            .allow_no_indices(true)
            .ignore_unavailable(true)
            .send()
            .await
            .map_err(|e| SearchIndexError::flush(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Flush failed");
            return Err(SearchIndexError::flush(format!(
                "Flush failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %pattern, "Index flushed");
        Ok(())
    }

    async fn bulk_upsert(
        &self,
        index: &str,
        doc_type: &str,
        documents: &[Document],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        let physical = physical_index_name(index, doc_type);
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        let mut ids = Vec::with_capacity(documents.len());

        for doc in documents {
            body.push(json!({ "index": { "_id": doc.id } }).into());
            body.push(doc.source().into());
            ids.push(doc.id.clone());
        }

        self.send_bulk("index", &physical, ids, body).await
    }

    async fn bulk_delete(
        &self,
        index: &str,
        doc_type: &str,
        ids: &[String],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if ids.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        let physical = physical_index_name(index, doc_type);
        let body: Vec<JsonBody<Value>> = ids
            .iter()
            .map(|id| json!({ "delete": { "_id": id } }).into())
            .collect();

        self.send_bulk("delete", &physical, ids.to_vec(), body).await
    }
}
