//! Integration tests for the seeker indexing pipeline.
//!
//! These tests use the real mappings, registry and reindexer over the
//! in-memory source, with a mock SearchIndexProvider standing in for
//! OpenSearch.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use seeker::mapping::{DocumentMapping, Enumeration, Indexable, IndexableRef};
use seeker::source::memory::{MemoryRecord, MemorySelection};
use seeker::source::{Attribute, EntityType, FieldDescriptor, FieldKind, Record, RecordRef};
use seeker::{AppConfig, Registry, Reindexer, SeekerError, Settings, SourceError};
use seeker_repository::{
    BatchOperationResult, BatchOperationSummary, Connections, SearchIndexError,
    SearchIndexProvider, SearchIndexService, SearchIndexServiceConfig,
};
use seeker_shared::{Document, FieldSchema, FieldType, Value};

type Target = (String, String);

/// In-memory stand-in for the search engine.
#[derive(Default)]
struct MockProvider {
    mappings: Mutex<HashMap<Target, JsonValue>>,
    documents: Mutex<HashMap<Target, BTreeMap<String, JsonValue>>>,
    bulk_sizes: Mutex<Vec<usize>>,
    calls: Mutex<Vec<String>>,
    reject: Vec<String>,
}

impl MockProvider {
    fn rejecting(ids: &[&str]) -> Self {
        Self {
            reject: ids.iter().map(|id| id.to_string()).collect(),
            ..Self::default()
        }
    }

    fn target(index: &str, doc_type: &str) -> Target {
        (index.to_string(), doc_type.to_string())
    }

    fn record_call(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn document(&self, index: &str, doc_type: &str, id: &str) -> Option<JsonValue> {
        self.documents
            .lock()
            .unwrap()
            .get(&Self::target(index, doc_type))
            .and_then(|docs| docs.get(id).cloned())
    }

    fn document_count(&self, index: &str, doc_type: &str) -> usize {
        self.documents
            .lock()
            .unwrap()
            .get(&Self::target(index, doc_type))
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl SearchIndexProvider for MockProvider {
    async fn mapping_exists(&self, index: &str, doc_type: &str) -> Result<bool, SearchIndexError> {
        Ok(self
            .mappings
            .lock()
            .unwrap()
            .contains_key(&Self::target(index, doc_type)))
    }

    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        mapping: &JsonValue,
    ) -> Result<(), SearchIndexError> {
        self.record_call(format!("put_mapping {}/{}", index, doc_type));
        self.mappings
            .lock()
            .unwrap()
            .insert(Self::target(index, doc_type), mapping.clone());
        Ok(())
    }

    async fn delete_mapping(&self, index: &str, doc_type: &str) -> Result<(), SearchIndexError> {
        self.record_call(format!("delete_mapping {}/{}", index, doc_type));
        let target = Self::target(index, doc_type);
        self.mappings.lock().unwrap().remove(&target);
        self.documents.lock().unwrap().remove(&target);
        Ok(())
    }

    async fn flush(&self, index: &str) -> Result<(), SearchIndexError> {
        self.record_call(format!("flush {}", index));
        Ok(())
    }

    async fn bulk_upsert(
        &self,
        index: &str,
        doc_type: &str,
        documents: &[Document],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.bulk_sizes.lock().unwrap().push(documents.len());

        let mut store = self.documents.lock().unwrap();
        let docs = store.entry(Self::target(index, doc_type)).or_default();
        let results = documents
            .iter()
            .map(|doc| {
                if self.reject.contains(&doc.id) {
                    BatchOperationResult::failed(
                        doc.id.clone(),
                        SearchIndexError::bulk_index("status 400: mapper_parsing_exception"),
                    )
                } else {
                    docs.insert(doc.id.clone(), doc.source());
                    BatchOperationResult::succeeded(doc.id.clone())
                }
            })
            .collect();
        Ok(BatchOperationSummary::from_results(results))
    }

    async fn bulk_delete(
        &self,
        index: &str,
        doc_type: &str,
        ids: &[String],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.record_call(format!("bulk_delete {}/{} {:?}", index, doc_type, ids));
        if let Some(docs) = self
            .documents
            .lock()
            .unwrap()
            .get_mut(&Self::target(index, doc_type))
        {
            for id in ids {
                docs.remove(id);
            }
        }
        Ok(BatchOperationSummary::from_results(
            ids.iter().map(BatchOperationResult::succeeded).collect(),
        ))
    }
}

fn connections(provider: &Arc<MockProvider>, config: SearchIndexServiceConfig) -> Connections {
    let shared: Arc<dyn SearchIndexProvider> = provider.clone();
    Connections::with_default(SearchIndexService::from_shared(shared, config))
}

fn article_type() -> Arc<EntityType> {
    Arc::new(
        EntityType::new("Article")
            .field(FieldDescriptor::new("title", FieldKind::Char))
            .field(FieldDescriptor::new("published", FieldKind::Date))
            .field(FieldDescriptor::new("draft", FieldKind::Boolean))
            .field(FieldDescriptor::new(
                "tags",
                FieldKind::ToMany {
                    target: "Tag".to_string(),
                },
            )),
    )
}

fn tag(pk: i64, name: &str) -> RecordRef {
    MemoryRecord::new("Tag", pk)
        .with_value("name", name)
        .with_label(name)
        .into_ref()
}

fn article(pk: i64) -> MemoryRecord {
    MemoryRecord::new("Article", pk)
        .with_value("title", format!("Article {}", pk))
        .with_value("draft", pk % 2 == 0)
        .with_many("tags", vec![tag(1, "rust"), tag(2, "search")])
}

fn articles(count: i64) -> Vec<RecordRef> {
    (1..=count).map(|pk| article(pk).into_ref()).collect()
}

/// Only non-draft articles.
struct PublishedArticles {
    mapping: DocumentMapping,
}

#[async_trait]
impl Indexable for PublishedArticles {
    fn mapping(&self) -> &DocumentMapping {
        &self.mapping
    }

    fn eligible(&self, record: &dyn Record) -> bool {
        !matches!(record.attribute("draft"), Attribute::Scalar(Value::Bool(true)))
    }
}

#[tokio::test]
async fn test_batched_reindex_windows_and_chunks() {
    let provider = Arc::new(MockProvider::default());
    let reindexer = Reindexer::new(connections(&provider, SearchIndexServiceConfig::default()));

    let selection = MemorySelection::new(article_type(), articles(2500));
    let stats = selection.stats();
    let mapping = DocumentMapping::for_entity(selection.into_ref(), &Settings::default())
        .build()
        .unwrap();

    let summary = reindexer
        .reindex(&mapping, Enumeration::Batched)
        .await
        .unwrap();

    assert_eq!(summary.selected, 2500);
    assert_eq!(summary.enumerated, 2500);
    assert_eq!(summary.indexed, 2500);
    assert_eq!(summary.failed, 0);
    assert_eq!(stats.windows(), vec![0..1000, 1000..2000, 2000..2500]);
    assert_eq!(*provider.bulk_sizes.lock().unwrap(), vec![1000, 1000, 500]);
    assert_eq!(provider.document_count("seeker", "article"), 2500);
    assert_eq!(provider.calls()[0], "put_mapping seeker/article");
}

#[tokio::test]
async fn test_reindex_chunks_capped_by_connection_limit() {
    let provider = Arc::new(MockProvider::default());
    let reindexer = Reindexer::new(connections(
        &provider,
        SearchIndexServiceConfig::with_max_batch_size(300),
    ));

    let mapping = DocumentMapping::for_entity(
        MemorySelection::new(article_type(), articles(700)).into_ref(),
        &Settings::default(),
    )
    .build()
    .unwrap();

    let summary = reindexer.reindex(&mapping, Enumeration::Batched).await.unwrap();

    assert_eq!(summary.indexed, 700);
    assert_eq!(*provider.bulk_sizes.lock().unwrap(), vec![300, 300, 100]);
}

#[tokio::test]
async fn test_cursor_reindex_skips_ineligible() {
    let provider = Arc::new(MockProvider::default());
    let reindexer = Reindexer::new(connections(&provider, SearchIndexServiceConfig::default()));

    let selection = MemorySelection::new(article_type(), articles(10));
    let stats = selection.stats();
    let published = PublishedArticles {
        mapping: DocumentMapping::for_entity(selection.into_ref(), &Settings::default())
            .doc_type("published")
            .build()
            .unwrap(),
    };

    let summary = reindexer
        .reindex(&published, Enumeration::Cursor)
        .await
        .unwrap();

    assert_eq!(summary.selected, 10);
    assert_eq!(summary.enumerated, 5);
    assert_eq!(summary.indexed, 5);
    assert!(provider.document("seeker", "published", "1").is_some());
    assert!(provider.document("seeker", "published", "2").is_none());
    assert_eq!(stats.cursors_opened(), 1);
    assert_eq!(stats.cursors_closed(), 1);
    assert!(stats.windows().is_empty());
}

#[tokio::test]
async fn test_cursor_reindex_without_cursor_support() {
    let provider = Arc::new(MockProvider::default());
    let reindexer = Reindexer::new(connections(&provider, SearchIndexServiceConfig::default()));

    let selection = MemorySelection::new(article_type(), articles(3)).without_cursor();
    let stats = selection.stats();
    let mapping = DocumentMapping::for_entity(selection.into_ref(), &Settings::default())
        .build()
        .unwrap();

    let result = reindexer.reindex(&mapping, Enumeration::Cursor).await;

    assert!(matches!(
        result,
        Err(SeekerError::SourceError(SourceError::CursorUnsupported))
    ));
    assert!(provider.calls().is_empty());
    assert_eq!(stats.count_queries(), 0);
    assert_eq!(stats.cursors_opened(), 0);
}

#[tokio::test]
async fn test_rejected_documents_are_counted() {
    let provider = Arc::new(MockProvider::rejecting(&["3", "7"]));
    let reindexer = Reindexer::new(connections(&provider, SearchIndexServiceConfig::default()));

    let mapping = DocumentMapping::for_entity(
        MemorySelection::new(article_type(), articles(10)).into_ref(),
        &Settings::default(),
    )
    .build()
    .unwrap();

    let summary = reindexer.reindex(&mapping, Enumeration::Batched).await.unwrap();

    assert_eq!(summary.indexed, 8);
    assert_eq!(summary.failed, 2);
}

#[tokio::test]
async fn test_article_document_reaches_index() {
    let provider = Arc::new(MockProvider::default());
    let reindexer = Reindexer::new(connections(&provider, SearchIndexServiceConfig::default()));

    let record = MemoryRecord::new("Article", 5)
        .with_value("title", "Hello")
        .with_many("tags", vec![tag(1, "a"), tag(2, "b")])
        .into_ref();
    let mapping = DocumentMapping::for_entity(
        MemorySelection::new(article_type(), vec![record]).into_ref(),
        &Settings::default(),
    )
    .schema(
        FieldSchema::new()
            .with("title", FieldType::text_with_raw())
            .with("tags__name", FieldType::Keyword),
    )
    .build()
    .unwrap();

    reindexer.reindex(&mapping, Enumeration::Batched).await.unwrap();

    assert_eq!(
        provider.document("seeker", "article", "5"),
        Some(json!({ "title": "Hello", "tags__name": ["a", "b"] }))
    );
    let mappings = provider.mappings.lock().unwrap();
    let body = &mappings[&MockProvider::target("seeker", "article")];
    assert_eq!(body["properties"]["title"]["fields"]["raw"]["type"], "keyword");
    assert_eq!(body["properties"]["tags__name"]["type"], "keyword");
}

#[tokio::test]
async fn test_derived_schema_mapping() {
    let provider = Arc::new(MockProvider::default());
    let reindexer = Reindexer::new(connections(&provider, SearchIndexServiceConfig::default()));

    let mapping = DocumentMapping::for_entity(
        MemorySelection::new(article_type(), articles(1)).into_ref(),
        &Settings::default(),
    )
    .build()
    .unwrap();

    assert!(reindexer.ensure_mapping(&mapping).await.unwrap());
    assert!(!reindexer.ensure_mapping(&mapping).await.unwrap());

    let mappings = provider.mappings.lock().unwrap();
    let properties = &mappings[&MockProvider::target("seeker", "article")]["properties"];
    assert_eq!(properties["published"]["type"], "date");
    assert_eq!(properties["title"]["analyzer"], "snowball");
    assert!(properties.get("id").is_none());
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let provider = Arc::new(MockProvider::default());
    let connections = connections(&provider, SearchIndexServiceConfig::default());
    let reindexer = Reindexer::new(connections.clone());

    let mapping = DocumentMapping::for_entity(
        MemorySelection::new(article_type(), articles(3)).into_ref(),
        &Settings::default(),
    )
    .build()
    .unwrap();

    // Never populated.
    mapping.clear(&connections, None, None).await.unwrap();
    assert!(provider.calls().is_empty());

    reindexer.reindex(&mapping, Enumeration::Batched).await.unwrap();
    assert_eq!(provider.document_count("seeker", "article"), 3);

    mapping.clear(&connections, None, None).await.unwrap();
    let after_first = provider.calls();
    assert_eq!(
        &after_first[after_first.len() - 2..],
        &["delete_mapping seeker/article".to_string(), "flush seeker".to_string()]
    );
    assert_eq!(provider.document_count("seeker", "article"), 0);

    mapping.clear(&connections, None, None).await.unwrap();
    assert_eq!(provider.calls(), after_first);
    assert!(!provider
        .mappings
        .lock()
        .unwrap()
        .contains_key(&MockProvider::target("seeker", "article")));
}

#[tokio::test]
async fn test_clear_explicit_index_and_unknown_connection() {
    let provider = Arc::new(MockProvider::default());
    let connections = connections(&provider, SearchIndexServiceConfig::default());

    let mapping = DocumentMapping::for_entity(
        MemorySelection::new(article_type(), vec![]).into_ref(),
        &Settings::default(),
    )
    .build()
    .unwrap();

    provider
        .put_mapping("archive", "article", &json!({ "properties": {} }))
        .await
        .unwrap();
    mapping
        .clear(&connections, Some("default"), Some("archive"))
        .await
        .unwrap();
    assert!(provider
        .calls()
        .contains(&"delete_mapping archive/article".to_string()));

    let result = mapping.clear(&connections, Some("replica"), None).await;
    assert!(matches!(
        result,
        Err(SeekerError::SearchIndexError(SearchIndexError::UnknownConnection(ref alias))) if alias == "replica"
    ));
}

#[tokio::test]
async fn test_index_record_routes_to_every_mapping() {
    let provider = Arc::new(MockProvider::default());
    let reindexer = Reindexer::new(connections(&provider, SearchIndexServiceConfig::default()));
    let blog = AppConfig::new("site.blog", "blog");

    let objects = MemorySelection::new(article_type(), articles(4)).into_ref();
    let all: IndexableRef = Arc::new(
        DocumentMapping::for_entity(objects.clone(), &Settings::default())
            .build()
            .unwrap(),
    );
    let published: IndexableRef = Arc::new(PublishedArticles {
        mapping: DocumentMapping::for_entity(objects, &Settings::default())
            .doc_type("published")
            .build()
            .unwrap(),
    });

    let mut registry = Registry::new(vec![blog.clone()]);
    {
        let mut scope = registry.enter_app(&blog).unwrap();
        scope.register(Arc::clone(&all), None).unwrap();
        scope.register(Arc::clone(&published), None).unwrap();
        scope.register(Arc::clone(&published), None).unwrap();
    }
    assert_eq!(registry.mappings_for_app("blog").len(), 2);

    for mapping in registry.mappings() {
        reindexer
            .reindex(mapping.as_ref(), Enumeration::Batched)
            .await
            .unwrap();
    }
    assert_eq!(provider.document_count("seeker", "article"), 4);
    assert_eq!(provider.document_count("seeker", "published"), 2);

    // Article 3 becomes a draft: kept in `article`, dropped from `published`.
    let changed = article(3).with_value("draft", true).with_value("title", "Draft");
    let summary = reindexer.index_record(&registry, &changed).await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(
        provider.document("seeker", "article", "3").unwrap()["title"],
        "Draft"
    );
    assert!(provider.document("seeker", "published", "3").is_none());

    // Records of other entity types touch nothing.
    let tag = MemoryRecord::new("Tag", 1);
    let summary = reindexer.index_record(&registry, &tag).await.unwrap();
    assert_eq!(summary.total, 0);

    let summary = reindexer.remove_record(&registry, &article(1)).await.unwrap();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(provider.document_count("seeker", "article"), 3);
    assert_eq!(provider.document_count("seeker", "published"), 0);
}

#[tokio::test]
async fn test_reindex_unknown_connection() {
    let provider = Arc::new(MockProvider::default());
    let reindexer = Reindexer::new(connections(&provider, SearchIndexServiceConfig::default()));

    let mapping = DocumentMapping::for_entity(
        MemorySelection::new(article_type(), articles(1)).into_ref(),
        &Settings::default(),
    )
    .using("replica")
    .build()
    .unwrap();

    let result = reindexer.reindex(&mapping, Enumeration::Batched).await;
    assert!(matches!(
        result,
        Err(SeekerError::SearchIndexError(SearchIndexError::UnknownConnection(_)))
    ));
    assert!(provider.calls().is_empty());
}
