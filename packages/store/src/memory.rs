//! In-process [`ConflictStore`] implementation.
//!
//! Holds documents per index in insertion order and evaluates filters
//! directly. Useful for tests and for serving a small dataset without a
//! search cluster.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{BulkReport, ConflictStore, IndexDocument, SearchRequest, StoreError};

#[derive(Default)]
struct MemoryIndex {
    mapping: Value,
    ids: BTreeMap<String, usize>,
    documents: Vec<Map<String, Value>>,
}

/// A [`ConflictStore`] backed by in-memory vectors.
#[derive(Default)]
pub struct MemoryStore {
    indexes: RwLock<BTreeMap<String, MemoryIndex>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw documents to an index, creating it if needed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert_all(&self, index: &str, documents: impl IntoIterator<Item = Map<String, Value>>) {
        let mut indexes = self.indexes.write().expect("MemoryStore lock poisoned");
        let entry = indexes.entry(index.to_string()).or_default();
        entry.documents.extend(documents);
    }

    /// Number of documents in an index.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn count(&self, index: &str) -> usize {
        self.indexes
            .read()
            .expect("MemoryStore lock poisoned")
            .get(index)
            .map_or(0, |i| i.documents.len())
    }

    fn poisoned() -> StoreError {
        StoreError::Response {
            message: "MemoryStore lock poisoned".to_string(),
        }
    }
}

#[async_trait]
impl ConflictStore for MemoryStore {
    fn endpoint(&self) -> &str {
        "memory"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Map<String, Value>>, StoreError> {
        let indexes = self.indexes.read().map_err(|_| Self::poisoned())?;
        let Some(index) = indexes.get(&request.index) else {
            return Err(StoreError::Status {
                status: 404,
                body: format!("no such index [{}]", request.index),
            });
        };

        Ok(index
            .documents
            .iter()
            .filter(|doc| request.filters.iter().all(|f| f.matches(doc)))
            .take(request.size)
            .cloned()
            .collect())
    }

    async fn ensure_index(&self, index: &str, mapping: &Value) -> Result<bool, StoreError> {
        let mut indexes = self.indexes.write().map_err(|_| Self::poisoned())?;
        if indexes.contains_key(index) {
            return Ok(false);
        }
        indexes.insert(
            index.to_string(),
            MemoryIndex {
                mapping: mapping.clone(),
                ..MemoryIndex::default()
            },
        );
        Ok(true)
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: &[IndexDocument],
    ) -> Result<BulkReport, StoreError> {
        let mut indexes = self.indexes.write().map_err(|_| Self::poisoned())?;
        let entry = indexes.entry(index.to_string()).or_default();
        let mut report = BulkReport::default();

        for doc in documents {
            if !entry.mapping.is_null() && !doc.source.contains_key("geometry") {
                report.failed += 1;
                continue;
            }

            match doc.id.as_ref().and_then(|id| entry.ids.get(id).copied()) {
                Some(pos) => entry.documents[pos] = doc.source.clone(),
                None => {
                    if let Some(id) = &doc.id {
                        entry.ids.insert(id.clone(), entry.documents.len());
                    }
                    entry.documents.push(doc.source.clone());
                }
            }
            report.succeeded += 1;
        }

        Ok(report)
    }

    async fn info(&self) -> Result<Value, StoreError> {
        let indexes = self.indexes.read().map_err(|_| Self::poisoned())?;
        Ok(serde_json::json!({
            "name": "memory",
            "indexes": indexes.keys().collect::<Vec<_>>(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Filter;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn searches_with_filters_and_cap() {
        let store = MemoryStore::new();
        store.insert_all(
            "conflicts",
            vec![
                doc(json!({"year": 2020, "best": 5})),
                doc(json!({"year": 2020, "best": 50})),
                doc(json!({"year": 2021, "best": 50})),
                doc(json!({"year": 2020, "best": 500})),
            ],
        );

        let request = SearchRequest::new("conflicts", 10)
            .filter(Filter::term("year", 2020))
            .filter(Filter::range_gte("best", 10));
        let hits = store.search(&request).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["best"], 50);

        let capped = SearchRequest::new("conflicts", 1).filter(Filter::term("year", 2020));
        assert_eq!(store.search(&capped).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_index_is_an_error() {
        let store = MemoryStore::new();
        let err = store
            .search(&SearchRequest::new("nope", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn ensure_index_creates_once() {
        let store = MemoryStore::new();
        assert!(store.ensure_index("a", &json!({})).await.unwrap());
        assert!(!store.ensure_index("a", &json!({})).await.unwrap());
    }

    #[tokio::test]
    async fn bulk_index_upserts_by_id_and_counts_failures() {
        let store = MemoryStore::new();
        store.ensure_index("c", &json!({"mappings": {}})).await.unwrap();
        let docs = vec![
            IndexDocument {
                id: Some("1".to_string()),
                source: doc(json!({"v": 1, "geometry": null})),
            },
            IndexDocument {
                id: Some("1".to_string()),
                source: doc(json!({"v": 2, "geometry": null})),
            },
            IndexDocument {
                id: None,
                source: doc(json!({"v": 3})),
            },
        ];
        let report = store.bulk_index("c", &docs).await.unwrap();
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(store.count("c"), 1);
    }
}
