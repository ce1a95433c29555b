//! # Event Audit Core
//!
//! Pure primitives for the event audit store: schemaless documents,
//! backend-assigned identifiers, event types and the query model.
//!
//! This crate contains no I/O and no storage. It describes *what* is stored
//! and *how* it is asked for; the `event-audit-store` crate decides where.
//!
//! ## Key Types
//!
//! - [`Document`] - A JSON object parsed from an upstream event payload
//! - [`StoredDocument`] - A document together with its [`DocumentId`]
//! - [`DocumentId`] - 12-byte identifier assigned by the backend on save
//! - [`EventType`] - The closed set of known event types, each owning a collection
//! - [`Query`] - Filter, sort and page window executed by a backend
//! - [`IndexSpec`] - A composite ascending index over document fields

pub mod document;
pub mod error;
pub mod event;
pub mod query;
pub mod types;

pub use document::{Document, StoredDocument};
pub use error::{DocumentError, Result};
pub use event::{collection_name, EventRecord, EventType};
pub use query::{compare_values, Direction, Filter, IndexSpec, Page, Query, Sort};
pub use types::{DocumentId, IdGenerator};
