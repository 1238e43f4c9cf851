//! Search document types.
//!
//! This module defines the document structure handed to the bulk-indexing
//! transport: an id plus the derived field values.

use serde::Serialize;

use crate::types::value::Value;

/// Derived field values, in schema declaration order.
pub type Fields = Vec<(String, Value)>;

/// Document representation for the search index.
///
/// `id` must be unique within the document type. `fields` keeps the order in
/// which the schema declares its fields so derived output is reproducible.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Create a new document.
    ///
    /// # Example
    ///
    /// ```
    /// use seeker_shared::{Document, Value};
    ///
    /// let doc = Document::new("5", vec![("title".to_string(), Value::from("Hello"))]);
    /// assert_eq!(doc.get("title"), Some(&Value::from("Hello")));
    /// ```
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Field names in derivation order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// The `_source` body sent to the search engine.
    pub fn source(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl Serialize for Document {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
