//! # Event Audit Store Backends
//!
//! Document storage for the event audit store. Provides a trait-based
//! interface for collection-scoped persistence with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The [`Backend`] trait is the whole contract the audit service needs:
//! save with a generated id, point lookup, filter/sort/page queries, and
//! idempotent index creation. The primary implementation is
//! [`SqliteBackend`], with [`MemoryBackend`] for testing.
//!
//! ## Key Types
//!
//! - [`Backend`] - The async trait for all storage operations
//! - [`SqliteBackend`] - SQLite-based persistent storage
//! - [`MemoryBackend`] - In-memory storage for tests
//! - [`StoreConfig`] - Database name, location and busy timeout
//!
//! ## Usage
//!
//! ```rust,no_run
//! use event_audit_store::{Backend, SqliteBackend, StoreConfig};
//! use event_audit_core::Document;
//!
//! async fn example() {
//!     // Open the database named by the environment, or the defaults
//!     let backend = SqliteBackend::open_with(&StoreConfig::from_env().unwrap()).unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let backend = SqliteBackend::open_memory().unwrap();
//!
//!     let doc = Document::parse(r#"{"type":"main","id":1}"#).unwrap();
//!     let stored = backend.save("main", doc).await.unwrap();
//!     let found = backend.find_by_id("main", &stored.id).await.unwrap();
//!     assert_eq!(found, Some(stored));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Lazy collections**: a collection exists once something is saved or indexed in it
//! - **Idempotent indexes**: creating an existing index is a no-op
//! - **Integer ranges**: range filters only match integers in the i64 range
//! - **Stable pages**: ties in sort order fall back to insertion order

pub mod config;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use traits::Backend;
