//! Relational source collaborator.
//!
//! The indexing pipeline never runs queries itself. It talks to the relational
//! layer through the traits in this module: entity type descriptors, records
//! with tagged attributes, and selections that can count, fetch half-open
//! windows, stream through a server-side cursor, and look a record up by
//! primary key.

pub mod memory;

use async_trait::async_trait;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use seeker_shared::Value;

use crate::errors::SourceError;

/// Shared handle to a source record.
pub type RecordRef = Arc<dyn Record>;

/// Shared handle to a selection.
pub type SelectionRef = Arc<dyn Selection>;

/// Kind of a relational field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Auto-incrementing primary key. Never indexed by default.
    Auto,
    Char,
    Text,
    Integer,
    BigInteger,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    /// Foreign key to a single related record.
    ToOne { target: String },
    /// Collection of related records (one-to-many or many-to-many).
    ToMany { target: String },
}

impl FieldKind {
    pub fn is_to_many(&self) -> bool {
        matches!(self, FieldKind::ToMany { .. })
    }
}

/// Declared field of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    verbose_name: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            verbose_name: None,
        }
    }

    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = Some(verbose_name.into());
        self
    }

    /// Declared display label, or the field name with underscores as spaces.
    pub fn verbose_name(&self) -> String {
        self.verbose_name
            .clone()
            .unwrap_or_else(|| self.name.replace('_', " "))
    }
}

/// Relational entity type: a primary key plus its declared fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    name: String,
    pk: String,
    fields: Vec<FieldDescriptor>,
}

impl EntityType {
    /// New entity type whose primary key is an auto field named `id`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pk: "id".to_string(),
            fields: vec![FieldDescriptor::new("id", FieldKind::Auto)],
        }
    }

    /// Use `pk` as the primary key field instead of the implicit `id`.
    ///
    /// The field itself still has to be declared with `field`.
    pub fn with_pk(mut self, pk: impl Into<String>) -> Self {
        let pk = pk.into();
        self.fields
            .retain(|f| !(f.name == "id" && f.kind == FieldKind::Auto));
        self.pk = pk;
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pk(&self) -> &str {
        &self.pk
    }

    /// All declared fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a declared field.
    pub fn get_field(&self, name: &str) -> Result<&FieldDescriptor, SourceError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| SourceError::unknown_field(&self.name, name))
    }
}

/// Value of one named attribute on a record.
#[derive(Debug, Clone)]
pub enum Attribute {
    /// The record has no attribute with this name.
    Missing,
    /// Plain column value.
    Scalar(Value),
    /// Foreign key; `None` when the relation is empty.
    ToOne(Option<RecordRef>),
    /// Related records in the relation's natural order.
    ToMany(Vec<RecordRef>),
    /// Human-readable display value (e.g. the label of a choice). Path
    /// resolution stops here.
    Display(String),
}

/// A source record.
pub trait Record: Send + Sync + fmt::Debug {
    /// Name of the entity type this record belongs to.
    fn entity_name(&self) -> &str;

    /// Primary key value.
    fn pk(&self) -> Value;

    /// Read an attribute by name. Unknown names return `Attribute::Missing`.
    fn attribute(&self, name: &str) -> Attribute;

    /// Canonical string representation of the record.
    fn display(&self) -> String;
}

/// Row ordering applied to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionOrder {
    /// No explicit ordering.
    #[default]
    Unordered,
    /// Primary key ascending.
    PrimaryKey,
}

/// Forward-only server-side cursor.
///
/// Implementations release the server resource when dropped, so abandoning
/// an enumeration early still closes the cursor.
#[async_trait]
pub trait RecordCursor: Send {
    /// Next record, or `None` once exhausted.
    async fn next(&mut self) -> Result<Option<RecordRef>, SourceError>;
}

/// Logical set of candidate records of one entity type.
#[async_trait]
pub trait Selection: Send + Sync {
    fn entity_type(&self) -> &Arc<EntityType>;

    /// Copy of this selection with the given ordering.
    fn ordered(&self, order: SelectionOrder) -> SelectionRef;

    /// Number of records in the selection.
    async fn count(&self) -> Result<u64, SourceError>;

    /// Records in the half-open window `[start, end)`.
    async fn fetch(&self, window: Range<u64>) -> Result<Vec<RecordRef>, SourceError>;

    /// Whether `cursor` is available.
    fn supports_cursor(&self) -> bool {
        false
    }

    /// Open a server-side cursor over the selection.
    async fn cursor(&self) -> Result<Box<dyn RecordCursor>, SourceError> {
        Err(SourceError::CursorUnsupported)
    }

    /// Look a record up by its primary key rendered as a string.
    async fn get(&self, pk: &str) -> Result<Option<RecordRef>, SourceError>;
}
