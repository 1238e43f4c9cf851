//! Document mapping declarations.
//!
//! A `DocumentMapping` binds a document type (name, index, connection and
//! field schema) to an optional selection of source records. It is built once
//! at start-up and never changes afterwards.

mod indexable;

pub use indexable::{batch_windows, enumerate_records, Enumeration, Indexable, IndexableRef};

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use seeker_repository::DEFAULT_CONNECTION;
use seeker_shared::{FieldSchema, FieldType};

use crate::config::Settings;
use crate::errors::SeekerError;
use crate::schema::build_schema;
use crate::source::{EntityType, SelectionRef};

/// Declared document type.
#[derive(Clone)]
pub struct DocumentMapping {
    doc_type: String,
    index: String,
    using: String,
    schema: FieldSchema,
    batch_size: NonZeroUsize,
    objects: Option<SelectionRef>,
}

impl DocumentMapping {
    /// Start a declaration using the defaults in `settings`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use seeker::config::Settings;
    /// use seeker::mapping::DocumentMapping;
    /// use seeker::source::memory::MemorySelection;
    /// use seeker::source::{EntityType, FieldDescriptor, FieldKind};
    ///
    /// let article = Arc::new(
    ///     EntityType::new("Article").field(FieldDescriptor::new("title", FieldKind::Char)),
    /// );
    /// let objects = MemorySelection::new(article, vec![]).into_ref();
    ///
    /// let mapping = DocumentMapping::for_entity(objects, &Settings::default())
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(mapping.doc_type(), "article");
    /// assert_eq!(mapping.index(), "seeker");
    /// assert_eq!(mapping.using(), "default");
    /// ```
    pub fn builder(settings: &Settings) -> DocumentMappingBuilder {
        DocumentMappingBuilder {
            doc_type: None,
            index: settings.index.clone(),
            using: DEFAULT_CONNECTION.to_string(),
            schema: None,
            overrides: FieldSchema::new(),
            batch_size: settings.batch_size,
            objects: None,
        }
    }

    /// Start a declaration backed by `objects`.
    pub fn for_entity(objects: SelectionRef, settings: &Settings) -> DocumentMappingBuilder {
        Self::builder(settings).objects(objects)
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Connection identifier.
    pub fn using(&self) -> &str {
        &self.using
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// Default selection of candidate records, if the mapping is backed by an
    /// entity type.
    pub fn objects(&self) -> Option<&SelectionRef> {
        self.objects.as_ref()
    }

    pub fn entity_type(&self) -> Option<&Arc<EntityType>> {
        self.objects.as_ref().map(|objects| objects.entity_type())
    }
}

impl Indexable for DocumentMapping {
    fn mapping(&self) -> &DocumentMapping {
        self
    }
}

impl fmt::Debug for DocumentMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentMapping")
            .field("doc_type", &self.doc_type)
            .field("index", &self.index)
            .field("using", &self.using)
            .field("fields", &self.schema.names().collect::<Vec<_>>())
            .field("batch_size", &self.batch_size)
            .field("entity", &self.entity_type().map(|entity| entity.name()))
            .finish()
    }
}

/// Builder for `DocumentMapping`.
pub struct DocumentMappingBuilder {
    doc_type: Option<String>,
    index: String,
    using: String,
    schema: Option<FieldSchema>,
    overrides: FieldSchema,
    batch_size: usize,
    objects: Option<SelectionRef>,
}

impl DocumentMappingBuilder {
    /// Back the mapping with a selection of source records.
    pub fn objects(mut self, objects: SelectionRef) -> Self {
        self.objects = Some(objects);
        self
    }

    /// Document type name. Defaults to the lower-cased entity type name.
    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn using(mut self, using: impl Into<String>) -> Self {
        self.using = using.into();
        self
    }

    /// Use `schema` as is instead of deriving one from the entity type.
    pub fn schema(mut self, schema: FieldSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Override one field's type, or add a computed/path field.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.overrides.insert(name, field_type);
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Finish the declaration.
    ///
    /// # Returns
    ///
    /// * `Ok(DocumentMapping)` - The declared mapping
    /// * `Err(SeekerError::InvalidBatchSize)` - If the batch size is zero
    /// * `Err(SeekerError::ConfigError)` - If no document type name can be determined
    pub fn build(self) -> Result<DocumentMapping, SeekerError> {
        let batch_size = NonZeroUsize::new(self.batch_size).ok_or(SeekerError::InvalidBatchSize)?;
        let entity = self
            .objects
            .as_ref()
            .map(|objects| Arc::clone(objects.entity_type()));

        let doc_type = match (self.doc_type, &entity) {
            (Some(doc_type), _) => doc_type,
            (None, Some(entity)) => entity.name().to_lowercase(),
            (None, None) => {
                return Err(SeekerError::config(
                    "A mapping without an entity type needs an explicit document type",
                ))
            }
        };

        let schema = match (self.schema, &entity) {
            (Some(mut schema), _) => {
                for (name, field_type) in self.overrides.iter() {
                    schema.insert(name, field_type.clone());
                }
                schema
            }
            (None, Some(entity)) => build_schema(entity, self.overrides),
            (None, None) => self.overrides,
        };

        Ok(DocumentMapping {
            doc_type,
            index: self.index,
            using: self.using,
            schema,
            batch_size,
            objects: self.objects,
        })
    }
}
