//! # Event Audit Store
//!
//! Persists raw JSON events from the upstream event streams into one
//! document collection per event type, and reads them back by identifier
//! or by sequence range.
//!
//! ## Overview
//!
//! - **Save**: any JSON object with a `type` field is stored, unmodified,
//!   in the collection named by the lower-cased type
//! - **Find by id**: point lookup by the identifier assigned on save
//! - **Find all since**: events whose `id` is at least a minimum, ascending,
//!   one page at a time
//! - **Indexes**: every known event type's collection gets a composite
//!   `(type, dataType, source, id)` index before the service is usable
//!
//! ## Usage
//!
//! ```rust,no_run
//! use event_audit::{EventAuditService, EventType, Page};
//! use event_audit::store::{SqliteBackend, StoreConfig};
//!
//! async fn example() {
//!     let backend = SqliteBackend::open_with(&StoreConfig::from_env().unwrap()).unwrap();
//!     let service = EventAuditService::new(backend).await.unwrap();
//!
//!     let stored = service
//!         .save(r#"{"type":"main","id":65027303,"data":{"BlockAdded":{}}}"#)
//!         .await
//!         .unwrap();
//!
//!     let found = service.find_by_id(&stored.id, EventType::Main).await.unwrap();
//!     assert_eq!(found, Some(stored));
//!
//!     let mut page = Page::first(100);
//!     loop {
//!         let events = service
//!             .find_all_since(65_000_000, EventType::Main, page)
//!             .await
//!             .unwrap();
//!         for event in &events {
//!             println!("{}", event.to_json());
//!         }
//!         if events.is_last() {
//!             break;
//!         }
//!         page = events.next_page();
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `event_audit::core` - Documents, event types, queries and identifiers
//! - `event_audit::store` - The backend trait, SQLite and in-memory backends

pub mod config;
pub mod error;
pub mod service;

// Re-export component crates
pub use event_audit_core as core;
pub use event_audit_store as store;

pub use config::AuditConfig;
pub use error::{AuditError, Result};
pub use service::{EventAuditService, EventPage};

pub use event_audit_core::{
    Document, DocumentId, EventRecord, EventType, IndexSpec, Page, StoredDocument,
};
