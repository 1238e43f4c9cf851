//! Loader that drives document types into the search index.
//!
//! `Reindexer` is the bulk driver: it enumerates a mapping's records, derives
//! documents and sends them to the mapping's connection in bulk chunks. It
//! also routes single changed records to every mapping registered for their
//! entity type.

use futures::TryStreamExt;
use tracing::{debug, error, info, instrument, warn};

use seeker_repository::{
    BatchOperationResult, BatchOperationSummary, Connections, SearchIndexService,
};
use seeker_shared::Document;

use crate::errors::{SeekerError, SourceError};
use crate::mapping::{DocumentMapping, Enumeration, Indexable};
use crate::registry::Registry;
use crate::source::Record;

/// Outcome of a full reindex of one document type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexSummary {
    /// Candidate records reported by `count`.
    pub selected: u64,
    /// Eligible records that were turned into documents.
    pub enumerated: u64,
    /// Documents accepted by the search engine.
    pub indexed: usize,
    /// Documents rejected by the search engine.
    pub failed: usize,
}

/// Bulk indexing driver over a set of named connections.
#[derive(Debug, Clone)]
pub struct Reindexer {
    connections: Connections,
}

impl Reindexer {
    /// Create a new reindexer over the given connections.
    pub fn new(connections: Connections) -> Self {
        Self { connections }
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Create the document type's mapping unless it already exists.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The mapping was created
    /// * `Ok(false)` - The mapping already existed
    pub async fn ensure_mapping(&self, indexable: &dyn Indexable) -> Result<bool, SeekerError> {
        let mapping = indexable.mapping();
        let service = self.connections.get(mapping.using())?;

        if service
            .mapping_exists(mapping.index(), mapping.doc_type())
            .await?
        {
            debug!(doc_type = %mapping.doc_type(), "Mapping already exists");
            return Ok(false);
        }

        service
            .put_mapping(mapping.index(), mapping.doc_type(), mapping.schema())
            .await?;
        info!(
            index = %mapping.index(),
            doc_type = %mapping.doc_type(),
            fields = mapping.schema().len(),
            "Mapping created"
        );
        Ok(true)
    }

    /// Index every eligible record of a document type.
    ///
    /// Documents are sent in chunks of the mapping's batch size, capped by the
    /// connection's bulk limit, so at most one chunk is held in memory.
    /// Documents the engine rejects are counted in the summary; transport
    /// and source errors abort the run. Cursor mode on a selection without
    /// cursor support fails before the mapping is touched.
    #[instrument(skip(self, indexable), fields(doc_type = %indexable.mapping().doc_type()))]
    pub async fn reindex(
        &self,
        indexable: &dyn Indexable,
        mode: Enumeration,
    ) -> Result<ReindexSummary, SeekerError> {
        let mapping = indexable.mapping();
        let service = self.connections.get(mapping.using())?;

        if mode == Enumeration::Cursor && !indexable.selection()?.supports_cursor() {
            return Err(SourceError::CursorUnsupported.into());
        }

        self.ensure_mapping(indexable).await?;

        let mut summary = ReindexSummary {
            selected: indexable.count().await?,
            ..ReindexSummary::default()
        };

        let batch_size = mapping.batch_size().get();
        let chunk_size = match service.config().max_batch_size {
            Some(max) => batch_size.min(max.max(1)),
            None => batch_size,
        };

        info!(
            selected = summary.selected,
            chunk_size = chunk_size,
            mode = ?mode,
            "Starting reindex"
        );

        let mut pending: Vec<Document> = Vec::with_capacity(chunk_size);
        let mut records = indexable.enumerate(mode);

        while let Some(record) = records.try_next().await? {
            pending.push(indexable.document(record.as_ref()));
            summary.enumerated += 1;

            if pending.len() >= chunk_size {
                Self::load(&service, mapping, &mut pending, &mut summary).await?;
            }
        }
        Self::load(&service, mapping, &mut pending, &mut summary).await?;

        if summary.failed > 0 {
            warn!(
                indexed = summary.indexed,
                failed = summary.failed,
                "Reindex completed with some failures"
            );
        } else {
            info!(indexed = summary.indexed, "Reindex completed");
        }
        Ok(summary)
    }

    /// Send pending documents in one bulk request.
    async fn load(
        service: &SearchIndexService,
        mapping: &DocumentMapping,
        pending: &mut Vec<Document>,
        summary: &mut ReindexSummary,
    ) -> Result<(), SeekerError> {
        if pending.is_empty() {
            return Ok(());
        }

        let documents: Vec<Document> = pending.drain(..).collect();
        debug!(count = documents.len(), "Flushing documents to search index");

        let result = service
            .bulk_upsert(mapping.index(), mapping.doc_type(), &documents)
            .await
            .map_err(|e| {
                error!(error = %e, count = documents.len(), "Failed to bulk index documents");
                e
            })?;

        for failure in result.failures() {
            if let Some(ref err) = failure.error {
                error!(
                    document_id = %failure.document_id,
                    error = %err,
                    "Failed to index document"
                );
            }
        }

        summary.indexed += result.succeeded;
        summary.failed += result.failed;
        Ok(())
    }

    /// Re-derive a changed record in every document type backed by its entity
    /// type. Eligible records are upserted, ineligible ones are deleted.
    pub async fn index_record(
        &self,
        registry: &Registry,
        record: &dyn Record,
    ) -> Result<BatchOperationSummary, SeekerError> {
        let mut results: Vec<BatchOperationResult> = Vec::new();

        for indexable in registry.mappings_for_entity(record.entity_name()) {
            let mapping = indexable.mapping();
            let service = self.connections.get(mapping.using())?;

            let summary = if indexable.eligible(record) {
                let document = indexable.document(record);
                service
                    .bulk_upsert(mapping.index(), mapping.doc_type(), &[document])
                    .await?
            } else {
                service
                    .bulk_delete(mapping.index(), mapping.doc_type(), &[indexable.id(record)])
                    .await?
            };
            results.extend(summary.results);
        }

        debug!(
            entity = %record.entity_name(),
            mappings = results.len(),
            "Record synchronized"
        );
        Ok(BatchOperationSummary::from_results(results))
    }

    /// Delete a removed record from every document type backed by its entity
    /// type.
    pub async fn remove_record(
        &self,
        registry: &Registry,
        record: &dyn Record,
    ) -> Result<BatchOperationSummary, SeekerError> {
        let mut results: Vec<BatchOperationResult> = Vec::new();

        for indexable in registry.mappings_for_entity(record.entity_name()) {
            let mapping = indexable.mapping();
            let service = self.connections.get(mapping.using())?;
            let summary = service
                .bulk_delete(mapping.index(), mapping.doc_type(), &[indexable.id(record)])
                .await?;
            results.extend(summary.results);
        }

        Ok(BatchOperationSummary::from_results(results))
    }
}
