//! Event types and the upstream event envelope.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::{DocumentError, Result};

/// Map an event type label to its collection name.
///
/// The single naming rule shared by known and ad-hoc event types.
pub fn collection_name(event_type: &str) -> String {
    event_type.to_lowercase()
}

/// The known event types.
///
/// Each one is an upstream event channel and owns one collection, indexed
/// at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    /// Block, deploy-processed and fault events.
    Main,
    /// Deploy acceptance events.
    Deploys,
    /// Finality signature events.
    Sigs,
}

impl EventType {
    /// Every known event type.
    pub const ALL: [EventType; 3] = [EventType::Main, EventType::Deploys, EventType::Sigs];

    /// The upper-case label of this type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::Main => "MAIN",
            EventType::Deploys => "DEPLOYS",
            EventType::Sigs => "SIGS",
        }
    }

    /// Name of the collection holding events of this type.
    pub fn collection_name(&self) -> String {
        collection_name(self.as_str())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = DocumentError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DocumentError::UnknownEventType(s.to_string()))
    }
}

/// Typed view of an upstream event.
///
/// Documents are stored schemaless; this struct is for producers that build
/// events in code and for readers that want named fields back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event type label; also the collection key.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Where the event was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// The event's own sequence number, absent for unordered events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "dataType", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Raw event payload.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl EventRecord {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            source: None,
            id: None,
            data_type: None,
            data,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn into_document(self) -> Result<Document> {
        Document::from_value(serde_json::to_value(self)?)
    }
}

impl TryFrom<&Document> for EventRecord {
    type Error = DocumentError;

    fn try_from(doc: &Document) -> Result<Self> {
        doc.event_type()?;
        Ok(serde_json::from_value(Value::Object(doc.as_map().clone()))?)
    }
}
