//! The audit service: the single entry point for writing and reading events.
//!
//! The service maps event types to collections, owns index lifecycle, and
//! otherwise delegates to a [`Backend`]. It keeps no mutable state of its
//! own; clones share the backend and can be handed to concurrent consumers.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use event_audit_core::{
    collection_name, Document, DocumentId, EventRecord, EventType, Filter, Page, Query, Sort,
    StoredDocument,
};
use event_audit_store::Backend;

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};

/// The audit service.
///
/// Construction runs [`ensure_indexes`](Self::ensure_indexes); a value of
/// this type only exists once every configured collection is indexed.
pub struct EventAuditService<B: Backend> {
    /// The storage backend.
    backend: Arc<B>,
    /// Configuration.
    config: Arc<AuditConfig>,
}

impl<B: Backend> Clone for EventAuditService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: Backend> EventAuditService<B> {
    /// Create a service over `backend`, indexing every known event type.
    ///
    /// Fails with [`AuditError::IndexCreation`] if any index cannot be created.
    pub async fn new(backend: B) -> Result<Self> {
        Self::with_config(backend, AuditConfig::default()).await
    }

    /// Create a service with explicit configuration.
    pub async fn with_config(backend: B, config: AuditConfig) -> Result<Self> {
        let service = Self {
            backend: Arc::new(backend),
            config: Arc::new(config),
        };
        service.ensure_indexes().await?;
        info!(
            event_types = ?service.config.event_types,
            "event audit service ready"
        );
        Ok(service)
    }

    /// Get the backend reference.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Create the event index on the collection of every configured type.
    ///
    /// Idempotent; safe to run again and concurrently with saves.
    #[instrument(skip(self))]
    pub async fn ensure_indexes(&self) -> Result<()> {
        for &event_type in &self.config.event_types {
            let collection = event_type.collection_name();
            self.backend
                .create_index(&collection, &self.config.index)
                .await
                .map_err(|source| {
                    error!(%event_type, error = %source, "index creation failed");
                    AuditError::IndexCreation { event_type, source }
                })?;
            debug!(%event_type, index = %self.config.index.name(), "index ensured");
        }
        Ok(())
    }

    /// Save a raw JSON event payload.
    ///
    /// The payload must be a JSON object with a non-empty string `type`. It is
    /// stored in the collection named by the lower-cased type, with all of its
    /// fields intact. Unknown types are accepted into a new, unindexed
    /// collection.
    #[instrument(skip(self, payload), fields(len = payload.len()))]
    pub async fn save(&self, payload: &str) -> Result<StoredDocument> {
        let document = Document::parse(payload)?;
        self.save_document(document).await
    }

    /// Save a typed event record.
    #[instrument(skip(self, record), fields(event_type = %record.event_type))]
    pub async fn save_event(&self, record: EventRecord) -> Result<StoredDocument> {
        let document = record.into_document()?;
        self.save_document(document).await
    }

    async fn save_document(&self, document: Document) -> Result<StoredDocument> {
        let collection = collection_name(document.event_type()?);
        if !self.config.is_indexed(&collection) {
            warn!(%collection, "saving event of unknown type to an unindexed collection");
        }

        let stored = self.backend.save(&collection, document).await?;
        debug!(%collection, id = %stored.id, sequence = ?stored.body.sequence(), "saved event");
        Ok(stored)
    }

    /// Look up a stored event by the id assigned when it was saved.
    ///
    /// Returns `Ok(None)` if no such event exists in the type's collection.
    #[instrument(skip(self))]
    pub async fn find_by_id(
        &self,
        id: &DocumentId,
        event_type: EventType,
    ) -> Result<Option<StoredDocument>> {
        Ok(self
            .backend
            .find_by_id(&event_type.collection_name(), id)
            .await?)
    }

    /// One page of events whose sequence number `id` is at least `min_sequence`,
    /// in ascending sequence order.
    ///
    /// Events whose `id` is not an i64 integer are never returned. Events sharing a
    /// sequence number come back in the order they were saved, so walking
    /// pages with [`EventPage::next_page`] over unchanging data visits each
    /// event exactly once.
    #[instrument(skip(self))]
    pub async fn find_all_since(
        &self,
        min_sequence: i64,
        event_type: EventType,
        page: Page,
    ) -> Result<EventPage> {
        let query = Query::new(Filter::gte(Document::SEQUENCE_FIELD, min_sequence))
            .sort(Sort::ascending(Document::SEQUENCE_FIELD))
            .page(page);

        let documents = self
            .backend
            .find(&event_type.collection_name(), &query)
            .await?;
        Ok(EventPage { documents, page })
    }
}

/// One page of a range scan.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPage {
    documents: Vec<StoredDocument>,
    page: Page,
}

impl EventPage {
    /// The window that produced this page.
    pub fn page(&self) -> Page {
        self.page
    }

    /// The window to request next.
    pub fn next_page(&self) -> Page {
        self.page.next()
    }

    /// Whether this page came back short, so no later page has results.
    pub fn is_last(&self) -> bool {
        (self.documents.len() as u64) < self.page.limit || self.page.limit == 0
    }

    /// Matches in ascending `id` order.
    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<StoredDocument> {
        self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoredDocument> {
        self.documents.iter()
    }
}

impl IntoIterator for EventPage {
    type Item = StoredDocument;
    type IntoIter = std::vec::IntoIter<StoredDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventPage {
    type Item = &'a StoredDocument;
    type IntoIter = std::slice::Iter<'a, StoredDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_audit_store::MemoryBackend;

    async fn service() -> EventAuditService<MemoryBackend> {
        EventAuditService::new(MemoryBackend::new()).await.unwrap()
    }

    #[tokio::test]
    async fn test_new_indexes_every_known_type() {
        let service = service().await;
        let backend = service.backend();
        for event_type in EventType::ALL {
            assert_eq!(
                backend.indexes(&event_type.collection_name()).unwrap(),
                vec!["idx_type_dataType_source_id".to_string()]
            );
        }
    }

    #[tokio::test]
    async fn test_save_lower_cases_collection() {
        let service = service().await;
        let stored = service.save(r#"{"type":"MAIN","id":1}"#).await.unwrap();

        assert_eq!(service.backend().len("main").unwrap(), 1);
        let found = service.find_by_id(&stored.id, EventType::Main).await.unwrap();
        assert_eq!(found, Some(stored));
    }

    #[tokio::test]
    async fn test_save_rejects_bad_payloads() {
        let service = service().await;

        let err = service.save("not json").await.unwrap_err();
        assert!(matches!(err, AuditError::MalformedInput(_)));

        let err = service.save(r#""main""#).await.unwrap_err();
        assert!(matches!(err, AuditError::MalformedInput(_)));

        let err = service.save(r#"{"id":1,"data":{}}"#).await.unwrap_err();
        assert!(matches!(err, AuditError::MissingField("type")));

        let err = service.save(r#"{"type":null}"#).await.unwrap_err();
        assert!(matches!(err, AuditError::MissingField("type")));

        for event_type in EventType::ALL {
            assert_eq!(service.backend().len(&event_type.collection_name()).unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn test_save_event_record() {
        let service = service().await;
        let record = EventRecord::new("sigs", serde_json::json!({"FinalitySignature": {}}))
            .with_id(9)
            .with_source("http://localhost:9999/events/sigs");

        let stored = service.save_event(record.clone()).await.unwrap();
        assert_eq!(EventRecord::try_from(&stored.body).unwrap(), record);

        let err = service
            .save_event(EventRecord::new("", serde_json::Value::Null))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::MissingField("type")));
    }

    #[tokio::test]
    async fn test_event_page_helpers() {
        let service = service().await;
        for seq in 1..=3 {
            service
                .save(&format!(r#"{{"type":"main","id":{seq}}}"#))
                .await
                .unwrap();
        }

        let first = service
            .find_all_since(0, EventType::Main, Page::first(2))
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.page(), Page::first(2));
        assert!(!first.is_last());
        assert_eq!(first.next_page(), Page::new(2, 2));
        assert_eq!(first.documents()[0].body.sequence(), Some(1));

        let second = service
            .find_all_since(0, EventType::Main, first.next_page())
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second.page(), first.next_page());
        assert!(second.is_last());
        assert_eq!(first.iter().count(), first.documents().len());

        let sequences: Vec<i64> = (&first)
            .into_iter()
            .chain(&second)
            .filter_map(|d| d.body.sequence())
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);

        let owned = second.clone().into_documents();
        assert_eq!(owned, second.documents());
    }
}
