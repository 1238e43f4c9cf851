//! The indexable contract.
//!
//! `Indexable` is what the reindexer and the registry work with. Every method
//! has a default built on the declared `DocumentMapping`; a custom mapping
//! wraps a declaration and overrides the parts it needs (typically
//! `selection` for eager loading or `eligible` to skip drafts).

use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info};

use seeker_repository::Connections;
use seeker_shared::{Document, Fields, RAW_SUFFIX};

use crate::errors::{SeekerError, SourceError};
use crate::mapping::DocumentMapping;
use crate::resolve::resolve;
use crate::source::{Record, RecordRef, SelectionOrder, SelectionRef};

/// Shared handle to a registered mapping.
pub type IndexableRef = Arc<dyn Indexable>;

/// How `enumerate` walks the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Enumeration {
    /// Primary key order, one count query plus one query per window.
    #[default]
    Batched,
    /// One server-side cursor, no ordering.
    Cursor,
}

/// Half-open windows covering `[0, total)` in steps of `batch_size`.
///
/// The last window is shorter when `batch_size` does not divide `total`.
pub fn batch_windows(total: u64, batch_size: NonZeroUsize) -> impl Iterator<Item = Range<u64>> {
    let step = batch_size.get() as u64;
    (0..total)
        .step_by(batch_size.get())
        .map(move |start| start..start.saturating_add(step).min(total))
}

/// Lazily enumerate the eligible records of `indexable`.
///
/// Nothing is queried until the stream is polled. Dropping the stream early
/// drops any open cursor with it.
pub fn enumerate_records<'a, I>(
    indexable: &'a I,
    mode: Enumeration,
) -> BoxStream<'a, Result<RecordRef, SeekerError>>
where
    I: Indexable + ?Sized,
{
    match mode {
        Enumeration::Cursor => Box::pin(try_stream! {
            let selection = indexable.selection()?.ordered(SelectionOrder::Unordered);
            if !selection.supports_cursor() {
                Err::<(), _>(SeekerError::from(SourceError::CursorUnsupported))?;
            }
            let mut cursor = selection.cursor().await.map_err(SeekerError::from)?;

            while let Some(record) = cursor.next().await.map_err(SeekerError::from)? {
                if indexable.eligible(record.as_ref()) {
                    yield record;
                }
            }
        }),
        Enumeration::Batched => Box::pin(try_stream! {
            let selection = indexable.selection()?.ordered(SelectionOrder::PrimaryKey);
            let total = selection.count().await.map_err(SeekerError::from)?;

            for window in batch_windows(total, indexable.mapping().batch_size()) {
                debug!(
                    doc_type = %indexable.mapping().doc_type(),
                    start = window.start,
                    end = window.end,
                    total = total,
                    "Fetching window"
                );
                let records = selection.fetch(window).await.map_err(SeekerError::from)?;
                for record in records {
                    if indexable.eligible(record.as_ref()) {
                        yield record;
                    }
                }
            }
        }),
    }
}

/// Python-style capitalisation: first character upper case, the rest lower.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// A document type that can be enumerated, derived and cleared.
#[async_trait]
pub trait Indexable: Send + Sync {
    /// The declaration this document type is built from.
    fn mapping(&self) -> &DocumentMapping;

    /// Candidate records. Defaults to every record of the backing entity type.
    fn selection(&self) -> Result<SelectionRef, SeekerError> {
        let mapping = self.mapping();
        mapping
            .objects()
            .cloned()
            .ok_or_else(|| SeekerError::Unbound(mapping.doc_type().to_string()))
    }

    /// Number of candidate records, for progress reporting.
    async fn count(&self) -> Result<u64, SeekerError> {
        Ok(self.selection()?.count().await?)
    }

    /// Whether `record` belongs in the index.
    fn eligible(&self, _record: &dyn Record) -> bool {
        true
    }

    /// Forward-only lazy sequence of eligible records.
    ///
    /// Ineligible records are skipped but still use up a slot in their
    /// window, so the yielded count can be lower than `count`.
    fn enumerate(&self, mode: Enumeration) -> BoxStream<'_, Result<RecordRef, SeekerError>> {
        enumerate_records(self, mode)
    }

    /// Document id, unique within the document type.
    fn id(&self, record: &dyn Record) -> String {
        record.pk().to_string()
    }

    /// One resolved value per schema field, in schema order.
    fn data(&self, record: &dyn Record) -> Fields {
        self.mapping()
            .schema()
            .names()
            .map(|name| (name.to_string(), resolve(record, name)))
            .collect()
    }

    fn document(&self, record: &dyn Record) -> Document {
        Document::new(self.id(record), self.data(record))
    }

    /// Human-readable label for a schema field.
    ///
    /// Uses the declared field's verbose name when the backing entity type
    /// has one, and the humanized field name otherwise.
    fn label(&self, field_name: &str) -> String {
        let name = field_name
            .strip_suffix(RAW_SUFFIX)
            .and_then(|rest| rest.strip_suffix('.'))
            .unwrap_or(field_name);

        let declared = match self.mapping().entity_type() {
            Some(entity) => match entity.get_field(name) {
                Ok(field) => Some(field.verbose_name()),
                Err(_) => None,
            },
            None => None,
        };

        match declared {
            Some(verbose_name) => capitalize(&verbose_name),
            None => capitalize(&name.replace('_', " ")),
        }
    }

    /// Delete this document type from `index` (default: the declared index)
    /// on connection `using` (default: the declared connection).
    ///
    /// Absence of the document type is not an error.
    async fn clear(
        &self,
        connections: &Connections,
        using: Option<&str>,
        index: Option<&str>,
    ) -> Result<(), SeekerError> {
        let mapping = self.mapping();
        let service = connections.get(using.unwrap_or(mapping.using()))?;
        let index = index.unwrap_or(mapping.index());

        if !service.mapping_exists(index, mapping.doc_type()).await? {
            debug!(index = %index, doc_type = %mapping.doc_type(), "Nothing to clear");
            return Ok(());
        }

        service.delete_mapping(index, mapping.doc_type()).await?;
        service.flush(index).await?;

        info!(index = %index, doc_type = %mapping.doc_type(), "Document type cleared");
        Ok(())
    }

    /// Re-fetch the record a document was derived from.
    async fn instance(&self, id: &str) -> Result<RecordRef, SeekerError> {
        self.selection()?
            .get(id)
            .await?
            .ok_or_else(|| SeekerError::not_found(self.mapping().doc_type(), id))
    }
}
