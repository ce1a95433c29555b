//! Sample events and a ready-to-use service.
//!
//! The main-stream samples are real events as read from a node's
//! `/events/main` endpoint: an `ApiVersion` handshake without a sequence
//! number, a `BlockAdded` and a `DeployProcessed`.

use serde_json::{json, Value};

use event_audit::{EventAuditService, EventType, StoredDocument};
use event_audit_store::MemoryBackend;

/// The raw main-stream sample file: a JSON array of three events.
pub const MAIN_EVENTS_JSON: &str = include_str!("../data/kafka-events-main.json");

/// Sequence number of the sample `BlockAdded` event.
pub const BLOCK_ADDED_ID: i64 = 65_027_303;

/// Block hash carried by the sample `BlockAdded` event.
pub const BLOCK_HASH: &str = "5a91486c973deea304e26138206723278d9d269f4fe03bfc9e5fdb93e927236e";

/// Sequence number of the sample `DeployProcessed` event.
pub const DEPLOY_PROCESSED_ID: i64 = 65_028_921;

/// Deploy hash carried by the sample `DeployProcessed` event.
pub const DEPLOY_HASH: &str = "c7d0840f2275a18efcd716f425c06691f2ca1a0e6d7d7ecff49cab06c2428ee8";

/// API version announced by the sample `ApiVersion` event.
pub const API_VERSION: &str = "1.4.7";

/// The main-stream samples, each pretty-printed as it would arrive on the wire.
pub fn main_events() -> Vec<String> {
    let events: Vec<Value> =
        serde_json::from_str(MAIN_EVENTS_JSON).expect("sample events are valid JSON");
    events
        .iter()
        .map(|event| serde_json::to_string_pretty(event).expect("sample events serialize"))
        .collect()
}

/// The `ApiVersion` sample: no `id` field.
pub fn api_version_event() -> String {
    main_event(0)
}

/// The `BlockAdded` sample.
pub fn block_added_event() -> String {
    main_event(1)
}

/// The `DeployProcessed` sample.
pub fn deploy_processed_event() -> String {
    main_event(2)
}

fn main_event(index: usize) -> String {
    main_events().swap_remove(index)
}

/// A `DeployAccepted` event as published on the deploys stream.
pub fn deploy_accepted_event(id: i64) -> String {
    json!({
        "source": "http://localhost:9999/events/deploys",
        "type": "deploys",
        "dataType": "DeployAccepted",
        "id": id,
        "data": {
            "DeployAccepted": {
                "hash": format!("{id:064x}"),
                "header": {
                    "account": "01a35887f3962a6a232e8e11fa7d4567b6866d68850974aad7289ef287676825f6",
                    "ttl": "30m",
                    "gas_price": 1,
                    "chain_name": "casper"
                }
            }
        }
    })
    .to_string()
}

/// A `FinalitySignature` event as published on the sigs stream.
pub fn finality_signature_event(id: i64) -> String {
    json!({
        "source": "http://localhost:9999/events/sigs",
        "type": "sigs",
        "dataType": "FinalitySignature",
        "id": id,
        "data": {
            "FinalitySignature": {
                "block_hash": BLOCK_HASH,
                "era_id": 4922,
                "signature": format!("01{id:0128x}"),
                "public_key": "0106ca7c39cd272dbf21a86eeb3b36b7c26e2e9b94af64292419f7862936bca2ca"
            }
        }
    })
    .to_string()
}

/// A minimal event of the given type with sequence number `id`.
pub fn sequenced_event(event_type: EventType, id: i64) -> String {
    json!({
        "type": event_type.collection_name(),
        "id": id,
        "data": {},
    })
    .to_string()
}

/// A test fixture with a service over an in-memory backend.
pub struct TestFixture {
    pub service: EventAuditService<MemoryBackend>,
}

impl TestFixture {
    /// Create a fixture with every known event type indexed.
    pub async fn new() -> Self {
        let service = EventAuditService::new(MemoryBackend::new())
            .await
            .expect("memory backend indexes cannot fail");
        Self { service }
    }

    /// Get the backend, for inspecting collections and indexes.
    pub fn backend(&self) -> &MemoryBackend {
        self.service.backend()
    }

    /// Save one minimal event per sequence number, in the given order.
    pub async fn seed(
        &self,
        event_type: EventType,
        ids: impl IntoIterator<Item = i64>,
    ) -> Vec<StoredDocument> {
        let mut stored = Vec::new();
        for id in ids {
            let doc = self
                .service
                .save(&sequenced_event(event_type, id))
                .await
                .expect("seed event saves");
            stored.push(doc);
        }
        stored
    }
}
