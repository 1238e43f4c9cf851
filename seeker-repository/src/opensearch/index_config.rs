//! OpenSearch index configuration and naming.
//!
//! OpenSearch has no document types inside an index, so every document type
//! gets its own physical index named `{index}-{doc_type}`. All document types
//! of one logical index can be searched together through `{index}-*`.
//! Names may not contain the separator themselves, otherwise two targets
//! could share a physical index.

use serde_json::{json, Value};

/// Settings applied when a document type's physical index is created.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `number_of_shards` - Primary shards per document type index
    /// * `number_of_replicas` - Replicas per primary shard
    pub fn new(number_of_shards: u32, number_of_replicas: u32) -> Self {
        Self {
            number_of_shards,
            number_of_replicas,
        }
    }

    /// Index creation body: settings plus the document type's mapping.
    ///
    /// # Arguments
    ///
    /// * `mapping` - The mapping body, `{"properties": {..}}`
    pub fn create_body(&self, mapping: &Value) -> Value {
        json!({
            "settings": {
                "number_of_shards": self.number_of_shards,
                "number_of_replicas": self.number_of_replicas
            },
            "mappings": mapping
        })
    }
}

/// Joins a logical index and a document type into a physical index name.
pub const INDEX_SEPARATOR: char = '-';

/// Physical index holding one document type.
///
/// # Returns
///
/// The physical index name (e.g., "seeker-article")
pub fn physical_index_name(index: &str, doc_type: &str) -> String {
    format!("{}{}{}", index, INDEX_SEPARATOR, doc_type)
}

/// Wildcard pattern covering every document type of a logical index.
pub fn index_pattern(index: &str) -> String {
    format!("{}{}*", index, INDEX_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_body_structure() {
        let mapping = json!({ "properties": { "title": { "type": "keyword" } } });
        let body = IndexConfig::new(2, 0).create_body(&mapping);

        assert_eq!(body["settings"]["number_of_shards"], 2);
        assert_eq!(body["settings"]["number_of_replicas"], 0);
        assert_eq!(body["mappings"]["properties"]["title"]["type"], "keyword");
    }

    #[test]
    fn test_physical_index_name() {
        assert_eq!(physical_index_name("seeker", "article"), "seeker-article");
        assert_eq!(index_pattern("seeker"), "seeker-*");
    }
}
