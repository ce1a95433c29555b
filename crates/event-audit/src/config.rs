//! Configuration for the audit service.

use event_audit_core::{EventType, IndexSpec};

/// Configuration for the audit service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    /// Event types whose collections are indexed at start-up.
    pub event_types: Vec<EventType>,
    /// Index created on each of those collections.
    pub index: IndexSpec,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            event_types: EventType::ALL.to_vec(),
            index: IndexSpec::event_default(),
        }
    }
}

impl AuditConfig {
    /// Whether `collection` belongs to one of the configured event types.
    pub fn is_indexed(&self, collection: &str) -> bool {
        self.event_types
            .iter()
            .any(|t| t.collection_name() == collection)
    }
}
