//! # Event Audit Testkit
//!
//! Testing utilities for the event audit store.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Real sample events from each upstream stream, and a
//!   ready service over an in-memory backend
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! ```rust
//! use event_audit::EventType;
//! use event_audit_testkit::fixtures::{block_added_event, TestFixture};
//!
//! # tokio_test_block_on(async {
//! let fixture = TestFixture::new().await;
//! let stored = fixture.service.save(&block_added_event()).await.unwrap();
//! let found = fixture.service.find_by_id(&stored.id, EventType::Main).await.unwrap();
//! assert_eq!(found, Some(stored));
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use event_audit_testkit::generators::{event_from_params, EventParams};
//!
//! proptest! {
//!     #[test]
//!     fn event_keeps_its_type(params: EventParams) {
//!         let doc = event_from_params(&params).into_document().unwrap();
//!         prop_assert_eq!(doc.event_type().unwrap(), params.event_type.collection_name());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    api_version_event, block_added_event, deploy_accepted_event, deploy_processed_event,
    finality_signature_event, main_events, sequenced_event, TestFixture,
};
pub use generators::{event_document, event_from_params, EventParams};
