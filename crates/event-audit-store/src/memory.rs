//! In-memory implementation of the Backend trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::{debug, info};

use event_audit_core::{Document, DocumentId, IdGenerator, IndexSpec, Query, StoredDocument};

use crate::error::{Result, StoreError};
use crate::traits::Backend;

/// In-memory backend.
///
/// All data is lost when the backend is dropped. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: RwLock<MemoryBackendInner>,
    ids: IdGenerator,
}

#[derive(Debug, Default)]
struct MemoryBackendInner {
    collections: BTreeMap<String, Collection>,
}

#[derive(Debug, Default)]
struct Collection {
    /// Documents in insertion order.
    documents: Vec<StoredDocument>,

    /// Position index: id -> offset into `documents`.
    positions: HashMap<DocumentId, usize>,

    /// Index specs by name.
    indexes: BTreeMap<String, IndexSpec>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all collections, sorted.
    pub fn collections(&self) -> Result<Vec<String>> {
        Ok(self.read()?.collections.keys().cloned().collect())
    }

    /// Names of the indexes on a collection, sorted.
    pub fn indexes(&self, collection: &str) -> Result<Vec<String>> {
        Ok(self
            .read()?
            .collections
            .get(collection)
            .map(|c| c.indexes.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> Result<usize> {
        Ok(self
            .read()?
            .collections
            .get(collection)
            .map_or(0, |c| c.documents.len()))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryBackendInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryBackendInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl MemoryBackendInner {
    fn collection_mut(&mut self, name: &str) -> &mut Collection {
        if !self.collections.contains_key(name) {
            info!(collection = name, "created collection");
        }
        self.collections.entry(name.to_string()).or_default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn save(&self, collection: &str, document: Document) -> Result<StoredDocument> {
        let mut inner = self.write()?;
        let coll = inner.collection_mut(collection);

        let mut id = self.ids.next_id();
        while coll.positions.contains_key(&id) {
            id = self.ids.next_id();
        }

        let stored = StoredDocument::new(id, document);
        coll.positions.insert(id, coll.documents.len());
        coll.documents.push(stored.clone());

        debug!(collection, %id, "saved document");
        Ok(stored)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>> {
        let inner = self.read()?;
        Ok(inner.collections.get(collection).and_then(|c| {
            c.positions
                .get(id)
                .and_then(|&pos| c.documents.get(pos))
                .cloned()
        }))
    }

    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>> {
        let inner = self.read()?;
        let Some(coll) = inner.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&StoredDocument> = coll
            .documents
            .iter()
            .filter(|d| query.filter.matches(&d.body))
            .collect();

        // Stable sort: equal keys keep insertion order.
        if let Some(sort) = &query.sort {
            matched.sort_by(|a, b| sort.compare(&a.body, &b.body));
        }

        let window = match query.page {
            Some(page) => page.apply(matched),
            None => matched,
        };

        debug!(collection, ?query, returned = window.len(), "executed query");
        Ok(window.into_iter().cloned().collect())
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<()> {
        let mut inner = self.write()?;
        let coll = inner.collection_mut(collection);
        let name = spec.name();
        if !coll.indexes.contains_key(&name) {
            debug!(collection, index = %name, "created index");
            coll.indexes.insert(name, spec.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_audit_core::{Filter, Page, Sort};
    use serde_json::json;

    fn event(value: serde_json::Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_memory_backend_basic() {
        let backend = MemoryBackend::new();
        let doc = event(json!({"type": "main", "id": 1}));

        let stored = backend.save("main", doc.clone()).await.unwrap();
        assert_eq!(stored.body, doc);

        let found = backend.find_by_id("main", &stored.id).await.unwrap().unwrap();
        assert_eq!(found, stored);
        assert_eq!(backend.len("main").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_collection() {
        let backend = MemoryBackend::new();
        let stored = backend
            .save("main", event(json!({"type": "main"})))
            .await
            .unwrap();

        assert!(backend.find_by_id("sigs", &stored.id).await.unwrap().is_none());
        assert!(backend
            .find_by_id("main", &DocumentId::from_bytes([0; 12]))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_on_missing_collection_is_empty() {
        let backend = MemoryBackend::new();
        let found = backend.find("nothing", &Query::all()).await.unwrap();
        assert!(found.is_empty());
        assert!(backend.collections().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_ties_keep_insertion_order() {
        let backend = MemoryBackend::new();
        for (seq, tag) in [(2, "a"), (1, "b"), (2, "c"), (1, "d")] {
            backend
                .save("main", event(json!({"type": "main", "id": seq, "tag": tag})))
                .await
                .unwrap();
        }

        let query = Query::new(Filter::gte("id", 0))
            .sort(Sort::ascending("id"))
            .page(Page::first(10));
        let tags: Vec<String> = backend
            .find("main", &query)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.body.get_str("tag").unwrap().to_string())
            .collect();
        assert_eq!(tags, ["b", "d", "a", "c"]);
    }

    #[tokio::test]
    async fn test_create_index_idempotent() {
        let backend = MemoryBackend::new();
        let spec = IndexSpec::event_default();

        backend.create_index("main", &spec).await.unwrap();
        backend.create_index("main", &spec).await.unwrap();

        assert_eq!(
            backend.indexes("main").unwrap(),
            vec!["idx_type_dataType_source_id".to_string()]
        );
        assert_eq!(backend.collections().unwrap(), vec!["main".to_string()]);
    }

    proptest::proptest! {
        #[test]
        fn prop_pages_partition_the_range(
            seqs in proptest::collection::vec(proptest::option::of(0i64..50), 0..40),
            min in 0i64..50,
            limit in 1u64..7,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let backend = MemoryBackend::new();
                for seq in &seqs {
                    let mut doc = event(json!({"type": "main"}));
                    if let Some(seq) = seq {
                        doc.insert("id", *seq);
                    }
                    backend.save("main", doc).await.unwrap();
                }

                let base = Query::new(Filter::gte("id", min)).sort(Sort::ascending("id"));
                let full = backend.find("main", &base).await.unwrap();

                let mut paged = Vec::new();
                let mut page = Page::first(limit);
                loop {
                    let chunk = backend.find("main", &base.clone().page(page)).await.unwrap();
                    let done = (chunk.len() as u64) < limit;
                    paged.extend(chunk);
                    if done {
                        break;
                    }
                    page = page.next();
                }

                assert_eq!(paged, full);
                let expected = seqs.iter().flatten().filter(|s| **s >= min).count();
                assert_eq!(full.len(), expected);
                assert!(full
                    .windows(2)
                    .all(|w| w[0].body.sequence() <= w[1].body.sequence()));
            });
        }
    }

    #[tokio::test]
    async fn test_sort_past_i64_ties_in_insertion_order() {
        let backend = MemoryBackend::new();
        for (id, tag) in [(json!(u64::MAX), "a"), (json!(u64::MAX - 1), "b"), (json!(5), "c")] {
            backend
                .save("main", event(json!({"type": "main", "id": id, "tag": tag})))
                .await
                .unwrap();
        }

        let query = Query::all().sort(Sort::ascending("id"));
        let tags: Vec<String> = backend
            .find("main", &query)
            .await
            .unwrap()
            .iter()
            .map(|d| d.body.get_str("tag").unwrap().to_string())
            .collect();
        assert_eq!(tags, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_range_skips_ids_outside_i64() {
        let backend = MemoryBackend::new();
        for id in [json!(u64::MAX), json!(7), json!(7.5), json!(true), json!(i64::MAX), json!(3)] {
            backend
                .save("main", event(json!({"type": "main", "id": id})))
                .await
                .unwrap();
        }

        let query = Query::new(Filter::gte("id", 0)).sort(Sort::ascending("id"));
        let seqs: Vec<i64> = backend
            .find("main", &query)
            .await
            .unwrap()
            .iter()
            .map(|d| d.body.sequence().unwrap())
            .collect();
        assert_eq!(seqs, vec![3, 7, i64::MAX]);
    }
}
