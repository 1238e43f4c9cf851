//! In-memory relational source.
//!
//! Backs tests and lets hosts index data that does not live in a relational
//! store. Every selection shares a `SelectionStats` handle recording the
//! queries issued against it, so callers can check how enumeration behaved.

use async_trait::async_trait;
use std::cmp::Ordering as CmpOrdering;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use seeker_shared::Value;

use crate::errors::SourceError;
use crate::source::{
    Attribute, EntityType, Record, RecordCursor, RecordRef, Selection, SelectionOrder,
    SelectionRef,
};

/// A record held in memory.
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    entity: String,
    pk: Value,
    label: Option<String>,
    attributes: Vec<(String, Attribute)>,
}

impl MemoryRecord {
    /// New record whose primary key is exposed as the `id` attribute.
    pub fn new(entity: impl Into<String>, pk: impl Into<Value>) -> Self {
        Self::keyed(entity, "id", pk)
    }

    /// New record whose primary key is exposed as the `pk_field` attribute.
    pub fn keyed(entity: impl Into<String>, pk_field: &str, pk: impl Into<Value>) -> Self {
        let pk = pk.into();
        Self {
            entity: entity.into(),
            pk: pk.clone(),
            label: None,
            attributes: vec![(pk_field.to_string(), Attribute::Scalar(pk))],
        }
    }

    fn set(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        let name = name.into();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = attribute,
            None => self.attributes.push((name, attribute)),
        }
        self
    }

    pub fn with_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, Attribute::Scalar(value.into()))
    }

    /// Attribute with a human-readable display value.
    pub fn with_display(self, name: impl Into<String>, display: impl Into<String>) -> Self {
        self.set(name, Attribute::Display(display.into()))
    }

    pub fn with_one(self, name: impl Into<String>, related: Option<RecordRef>) -> Self {
        self.set(name, Attribute::ToOne(related))
    }

    pub fn with_many(self, name: impl Into<String>, related: Vec<RecordRef>) -> Self {
        self.set(name, Attribute::ToMany(related))
    }

    /// Canonical string representation returned by `display`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn into_ref(self) -> RecordRef {
        Arc::new(self)
    }
}

impl Record for MemoryRecord {
    fn entity_name(&self) -> &str {
        &self.entity
    }

    fn pk(&self) -> Value {
        self.pk.clone()
    }

    fn attribute(&self, name: &str) -> Attribute {
        self.attributes
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, attribute)| attribute.clone())
            .unwrap_or(Attribute::Missing)
    }

    fn display(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("{} #{}", self.entity, self.pk),
        }
    }
}

/// Counters for the queries issued against a `MemorySelection`.
#[derive(Debug, Default)]
pub struct SelectionStats {
    count_queries: AtomicUsize,
    cursors_opened: AtomicUsize,
    cursors_closed: AtomicUsize,
    windows: Mutex<Vec<Range<u64>>>,
}

impl SelectionStats {
    pub fn count_queries(&self) -> usize {
        self.count_queries.load(Ordering::SeqCst)
    }

    pub fn cursors_opened(&self) -> usize {
        self.cursors_opened.load(Ordering::SeqCst)
    }

    pub fn cursors_closed(&self) -> usize {
        self.cursors_closed.load(Ordering::SeqCst)
    }

    /// Windows fetched so far, in request order.
    pub fn windows(&self) -> Vec<Range<u64>> {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record_window(&self, window: Range<u64>) {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(window);
    }
}

/// Primary key ordering: integers numerically, anything else by its string form.
fn compare_pk(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// A selection over records held in memory.
#[derive(Clone)]
pub struct MemorySelection {
    entity_type: Arc<EntityType>,
    records: Arc<Vec<RecordRef>>,
    order: SelectionOrder,
    cursor_support: bool,
    cursor_fails_after: Option<usize>,
    stats: Arc<SelectionStats>,
}

impl MemorySelection {
    /// Selection over `records`, kept in the given (insertion) order until
    /// ordered by primary key.
    pub fn new(entity_type: Arc<EntityType>, records: Vec<RecordRef>) -> Self {
        Self {
            entity_type,
            records: Arc::new(records),
            order: SelectionOrder::Unordered,
            cursor_support: true,
            cursor_fails_after: None,
            stats: Arc::new(SelectionStats::default()),
        }
    }

    /// Disable server-side cursors, as with a transport that lacks them.
    pub fn without_cursor(mut self) -> Self {
        self.cursor_support = false;
        self
    }

    /// Make cursors fail with a query error after yielding `count` records.
    pub fn with_cursor_failure_after(mut self, count: usize) -> Self {
        self.cursor_fails_after = Some(count);
        self
    }

    pub fn stats(&self) -> Arc<SelectionStats> {
        Arc::clone(&self.stats)
    }

    pub fn into_ref(self) -> SelectionRef {
        Arc::new(self)
    }

    fn rows(&self) -> Vec<RecordRef> {
        let mut rows = self.records.to_vec();
        if self.order == SelectionOrder::PrimaryKey {
            rows.sort_by(|a, b| compare_pk(&a.pk(), &b.pk()));
        }
        rows
    }
}

#[async_trait]
impl Selection for MemorySelection {
    fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    fn ordered(&self, order: SelectionOrder) -> SelectionRef {
        Arc::new(Self {
            order,
            ..self.clone()
        })
    }

    async fn count(&self) -> Result<u64, SourceError> {
        self.stats.count_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.len() as u64)
    }

    async fn fetch(&self, window: Range<u64>) -> Result<Vec<RecordRef>, SourceError> {
        self.stats.record_window(window.clone());

        let rows = self.rows();
        let start = (window.start as usize).min(rows.len());
        let end = (window.end as usize).clamp(start, rows.len());
        Ok(rows[start..end].to_vec())
    }

    fn supports_cursor(&self) -> bool {
        self.cursor_support
    }

    async fn cursor(&self) -> Result<Box<dyn RecordCursor>, SourceError> {
        if !self.cursor_support {
            return Err(SourceError::CursorUnsupported);
        }

        self.stats.cursors_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryCursor {
            rows: self.rows().into_iter(),
            yielded: 0,
            fails_after: self.cursor_fails_after,
            stats: Arc::clone(&self.stats),
        }))
    }

    async fn get(&self, pk: &str) -> Result<Option<RecordRef>, SourceError> {
        Ok(self
            .records
            .iter()
            .find(|record| record.pk().to_string() == pk)
            .cloned())
    }
}

/// Cursor over a snapshot of a `MemorySelection`. Counts itself closed on drop.
struct MemoryCursor {
    rows: std::vec::IntoIter<RecordRef>,
    yielded: usize,
    fails_after: Option<usize>,
    stats: Arc<SelectionStats>,
}

#[async_trait]
impl RecordCursor for MemoryCursor {
    async fn next(&mut self) -> Result<Option<RecordRef>, SourceError> {
        if self.fails_after == Some(self.yielded) {
            return Err(SourceError::query("cursor connection lost"));
        }
        let row = self.rows.next();
        if row.is_some() {
            self.yielded += 1;
        }
        Ok(row)
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.stats.cursors_closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FieldDescriptor, FieldKind};

    fn tags() -> Arc<EntityType> {
        Arc::new(EntityType::new("Tag").field(FieldDescriptor::new("name", FieldKind::Char)))
    }

    fn records(pks: &[i64]) -> Vec<RecordRef> {
        pks.iter()
            .map(|pk| MemoryRecord::new("Tag", *pk).into_ref())
            .collect()
    }

    #[test]
    fn test_record_attributes() {
        let author = MemoryRecord::new("Author", 1).with_label("Ada").into_ref();
        let article = MemoryRecord::new("Article", 5)
            .with_value("title", "Hello")
            .with_display("status", "Published")
            .with_one("author", Some(author));

        assert!(matches!(article.attribute("id"), Attribute::Scalar(Value::Integer(5))));
        assert!(matches!(article.attribute("title"), Attribute::Scalar(Value::Text(ref t)) if t == "Hello"));
        assert!(matches!(article.attribute("status"), Attribute::Display(ref d) if d == "Published"));
        assert!(matches!(article.attribute("author"), Attribute::ToOne(Some(ref a)) if a.display() == "Ada"));
        assert!(matches!(article.attribute("nope"), Attribute::Missing));
        assert_eq!(article.display(), "Article #5");
    }

    #[tokio::test]
    async fn test_primary_key_order() {
        let selection = MemorySelection::new(tags(), records(&[10, 2, 33, 1]));

        let unordered = selection.fetch(0..4).await.unwrap();
        let ordered = selection
            .ordered(SelectionOrder::PrimaryKey)
            .fetch(0..4)
            .await
            .unwrap();

        let pks = |rows: &[RecordRef]| rows.iter().map(|r| r.pk()).collect::<Vec<_>>();
        assert_eq!(pks(&unordered), [10, 2, 33, 1].map(Value::from).to_vec());
        assert_eq!(pks(&ordered), [1, 2, 10, 33].map(Value::from).to_vec());
    }

    #[tokio::test]
    async fn test_fetch_clamps_window() {
        let selection = MemorySelection::new(tags(), records(&[1, 2, 3]));

        assert_eq!(selection.fetch(2..10).await.unwrap().len(), 1);
        assert!(selection.fetch(5..10).await.unwrap().is_empty());
        assert_eq!(selection.stats().windows(), vec![2..10, 5..10]);
    }

    #[tokio::test]
    async fn test_cursor_closes_on_drop() {
        let selection = MemorySelection::new(tags(), records(&[1, 2, 3]));

        let mut cursor = selection.cursor().await.unwrap();
        assert!(cursor.next().await.unwrap().is_some());
        drop(cursor);

        let stats = selection.stats();
        assert_eq!(stats.cursors_opened(), 1);
        assert_eq!(stats.cursors_closed(), 1);
    }

    #[tokio::test]
    async fn test_cursor_unsupported() {
        let selection = MemorySelection::new(tags(), records(&[1])).without_cursor();

        assert!(!selection.supports_cursor());
        assert!(matches!(
            selection.cursor().await,
            Err(SourceError::CursorUnsupported)
        ));
    }

    #[tokio::test]
    async fn test_get_by_pk() {
        let selection = MemorySelection::new(tags(), records(&[1, 2]));

        assert!(selection.get("2").await.unwrap().is_some());
        assert!(selection.get("3").await.unwrap().is_none());
    }
}
