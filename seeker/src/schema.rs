//! Default search schemas derived from entity types.

use std::fmt;
use std::sync::Arc;

use seeker_shared::{FieldSchema, FieldType};

use crate::source::{EntityType, FieldDescriptor, FieldKind};

/// Maps a declared field to its search field type.
pub type FieldFactory = Arc<dyn Fn(&FieldDescriptor) -> FieldType + Send + Sync>;

/// Default search field type for a relational field.
///
/// Dates and datetimes become dates, integers become longs, and everything
/// else is analyzed text with a `raw` keyword sibling.
pub fn document_field(field: &FieldDescriptor) -> FieldType {
    match field.kind {
        FieldKind::Date | FieldKind::DateTime => FieldType::Date,
        FieldKind::Integer => FieldType::Long,
        _ => FieldType::text_with_raw(),
    }
}

/// Build the default schema for `entity`, applying `overrides` on top.
pub fn build_schema(entity: &EntityType, overrides: FieldSchema) -> FieldSchema {
    SchemaBuilder::new(entity).overrides(overrides).build()
}

/// Explicit schema builder for an entity type.
///
/// Every declared field except auto primary keys is derived, scalar and
/// to-one fields first, then to-many fields, each group in declaration order.
/// Overrides replace the derived type of a field in place; override names
/// that are not declared fields (computed fields, or paths such as
/// `author__name`) are appended after the derived fields.
///
/// # Example
///
/// ```
/// use seeker::schema::SchemaBuilder;
/// use seeker::source::{EntityType, FieldDescriptor, FieldKind};
/// use seeker_shared::{FieldSchema, FieldType};
///
/// let article = EntityType::new("Article")
///     .field(FieldDescriptor::new("title", FieldKind::Char))
///     .field(FieldDescriptor::new("views", FieldKind::Integer));
///
/// let schema = SchemaBuilder::new(&article)
///     .exclude(["views"])
///     .overrides(FieldSchema::new().with("author__name", FieldType::Keyword))
///     .build();
///
/// assert_eq!(schema.names().collect::<Vec<_>>(), vec!["title", "author__name"]);
/// ```
pub struct SchemaBuilder<'a> {
    entity: &'a EntityType,
    only: Option<Vec<String>>,
    exclude: Vec<String>,
    factory: Option<FieldFactory>,
    overrides: FieldSchema,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(entity: &'a EntityType) -> Self {
        Self {
            entity,
            only: None,
            exclude: Vec::new(),
            factory: None,
            overrides: FieldSchema::new(),
        }
    }

    /// Derive only the named fields.
    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Skip the named fields.
    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    /// Replace `document_field` for every derived field.
    pub fn field_factory(mut self, factory: FieldFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn overrides(mut self, overrides: FieldSchema) -> Self {
        for (name, field_type) in overrides.iter() {
            self.overrides.insert(name, field_type.clone());
        }
        self
    }

    /// Add a computed or path field that has no declared counterpart.
    pub fn computed(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.overrides.insert(name, field_type);
        self
    }

    fn selected(&self, field: &FieldDescriptor) -> bool {
        if field.kind == FieldKind::Auto {
            return false;
        }
        if let Some(only) = &self.only {
            if !only.contains(&field.name) {
                return false;
            }
        }
        !self.exclude.contains(&field.name)
    }

    fn derive(&self, field: &FieldDescriptor) -> FieldType {
        if let Some(field_type) = self.overrides.get(&field.name) {
            return field_type.clone();
        }
        match &self.factory {
            Some(factory) => factory(field),
            None => document_field(field),
        }
    }

    pub fn build(self) -> FieldSchema {
        let (many, scalar): (Vec<_>, Vec<_>) = self
            .entity
            .fields()
            .iter()
            .filter(|field| self.selected(field))
            .partition(|field| field.kind.is_to_many());

        let mut schema: FieldSchema = scalar
            .into_iter()
            .chain(many)
            .map(|field| (field.name.clone(), self.derive(field)))
            .collect();

        // Overrides are explicit: they land even for fields derivation skips.
        for (name, field_type) in self.overrides.iter() {
            if !schema.contains(name) {
                schema.insert(name, field_type.clone());
            }
        }

        schema
    }
}

impl fmt::Debug for SchemaBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("entity", &self.entity.name())
            .field("only", &self.only)
            .field("exclude", &self.exclude)
            .field("factory", &self.factory.is_some())
            .field("overrides", &self.overrides)
            .finish()
    }
}
