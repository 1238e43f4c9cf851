//! Search field types and document schemas.
//!
//! A `FieldSchema` is the declared layout of one document type: every field
//! name (a `__`-separated path on the source record) mapped to the search
//! engine field type it is indexed as.

use serde_json::{json, Map, Value as JsonValue};

/// Name of the exact-match sibling field attached to analyzed text fields.
pub const RAW_SUFFIX: &str = "raw";

/// Analyzer used for derived text fields.
pub const DEFAULT_ANALYZER: &str = "snowball";

/// Search engine field type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Full-text analyzed string, optionally with sub-fields such as `raw`.
    Text {
        analyzer: Option<String>,
        fields: Vec<(String, FieldType)>,
    },
    /// Exact, not analyzed string.
    Keyword,
    Date,
    Long,
    Integer,
    Double,
    Boolean,
    /// Nested composite with its own properties.
    Nested(FieldSchema),
}

impl FieldType {
    /// Analyzed text with a `raw` keyword sibling, the default for any field
    /// kind without a more specific mapping.
    pub fn text_with_raw() -> Self {
        FieldType::Text {
            analyzer: Some(DEFAULT_ANALYZER.to_string()),
            fields: vec![(RAW_SUFFIX.to_string(), FieldType::Keyword)],
        }
    }

    /// Plain analyzed text using the engine's default analyzer.
    pub fn text() -> Self {
        FieldType::Text {
            analyzer: None,
            fields: Vec::new(),
        }
    }

    /// Render the engine mapping for this field.
    pub fn to_mapping(&self) -> JsonValue {
        match self {
            FieldType::Text { analyzer, fields } => {
                let mut mapping = Map::new();
                mapping.insert("type".to_string(), json!("text"));
                if let Some(analyzer) = analyzer {
                    mapping.insert("analyzer".to_string(), json!(analyzer));
                }
                if !fields.is_empty() {
                    let sub_fields = fields
                        .iter()
                        .map(|(name, field)| (name.clone(), field.to_mapping()))
                        .collect::<Map<_, _>>();
                    mapping.insert("fields".to_string(), JsonValue::Object(sub_fields));
                }
                JsonValue::Object(mapping)
            }
            FieldType::Keyword => json!({ "type": "keyword" }),
            FieldType::Date => json!({ "type": "date" }),
            FieldType::Long => json!({ "type": "long" }),
            FieldType::Integer => json!({ "type": "integer" }),
            FieldType::Double => json!({ "type": "double" }),
            FieldType::Boolean => json!({ "type": "boolean" }),
            FieldType::Nested(schema) => json!({
                "type": "nested",
                "properties": schema.properties(),
            }),
        }
    }
}

/// Ordered field name → field type table with unique keys.
///
/// Declaration order is kept so document derivation is deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSchema {
    fields: Vec<(String, FieldType)>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing the type of an existing field with the same
    /// name in place.
    pub fn insert(&mut self, name: impl Into<String>, field_type: FieldType) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = field_type,
            None => self.fields.push((name, field_type)),
        }
    }

    /// Builder-style `insert`.
    pub fn with(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.insert(name, field_type);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldType> {
        let position = self.fields.iter().position(|(existing, _)| existing == name)?;
        Some(self.fields.remove(position).1)
    }

    pub fn get(&self, name: &str) -> Option<&FieldType> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, field_type)| field_type)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields
            .iter()
            .map(|(name, field_type)| (name.as_str(), field_type))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `properties` object of the engine mapping.
    pub fn properties(&self) -> JsonValue {
        let properties = self
            .fields
            .iter()
            .map(|(name, field_type)| (name.clone(), field_type.to_mapping()))
            .collect::<Map<_, _>>();
        JsonValue::Object(properties)
    }

    /// The full mapping body for a document type.
    pub fn to_mapping(&self) -> JsonValue {
        json!({ "properties": self.properties() })
    }
}

impl FromIterator<(String, FieldType)> for FieldSchema {
    fn from_iter<I: IntoIterator<Item = (String, FieldType)>>(iter: I) -> Self {
        let mut schema = FieldSchema::new();
        for (name, field_type) in iter {
            schema.insert(name, field_type);
        }
        schema
    }
}
