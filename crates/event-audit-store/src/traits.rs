//! Backend trait: the abstract interface for document persistence.
//!
//! This is the entire surface the audit store needs from a database.
//! Any engine offering document CRUD, a filter/sort/page query primitive and
//! secondary index creation can implement it.

use std::sync::Arc;

use async_trait::async_trait;
use event_audit_core::{Document, DocumentId, IndexSpec, Query, StoredDocument};

use crate::error::Result;

/// The Backend trait: async interface for document persistence.
///
/// # Design Notes
///
/// - **Lazy collections**: `save` and `create_index` create the collection
///   on first use. Reads against a collection that does not exist return
///   nothing rather than failing.
/// - **Idempotent indexes**: `create_index` with a spec that already exists
///   on the collection does nothing.
/// - **Range semantics**: see [`event_audit_core::query`]. Implementations
///   must agree on filtering, ordering and tie-breaking by insertion order.
/// - **No retries**: failures are returned as-is; callers own retry policy.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Assign a fresh identifier and persist the document.
    async fn save(&self, collection: &str, document: Document) -> Result<StoredDocument>;

    /// Point lookup by backend-assigned identifier.
    async fn find_by_id(&self, collection: &str, id: &DocumentId)
        -> Result<Option<StoredDocument>>;

    /// Execute a filter/sort/page query.
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>>;

    /// Create a composite index if it does not already exist.
    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<()>;
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    async fn save(&self, collection: &str, document: Document) -> Result<StoredDocument> {
        (**self).save(collection, document).await
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>> {
        (**self).find_by_id(collection, id).await
    }

    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>> {
        (**self).find(collection, query).await
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<()> {
        (**self).create_index(collection, spec).await
    }
}
