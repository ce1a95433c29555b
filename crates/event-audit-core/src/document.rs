//! Schemaless documents.
//!
//! A [`Document`] is a JSON object: a map from field names to
//! [`serde_json::Value`], which is itself the recursive tagged union of
//! null, bool, number, string, array and object. Apart from the `type`
//! discriminator and the `id` sequence number, fields pass through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocumentError, Result};
use crate::types::DocumentId;

/// A JSON object parsed from an event payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Field holding the event type discriminator.
    pub const TYPE_FIELD: &'static str = "type";
    /// Field holding the event's own sequence number.
    pub const SEQUENCE_FIELD: &'static str = "id";
    /// Field under which [`StoredDocument::to_json`] renders the document id.
    pub const ID_FIELD: &'static str = "_id";

    /// Create an empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a JSON payload.
    ///
    /// Fails with [`DocumentError::Malformed`] on invalid JSON and
    /// [`DocumentError::NotAnObject`] when the top-level value is not an object.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DocumentError::NotAnObject(json_kind(&other))),
        }
    }

    /// The event type discriminator.
    ///
    /// Fails with [`DocumentError::MissingField`] if `type` is absent, not a
    /// string, or empty.
    pub fn event_type(&self) -> Result<&str> {
        match self.get_str(Self::TYPE_FIELD) {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(DocumentError::MissingField(Self::TYPE_FIELD)),
        }
    }

    /// The event's own sequence number, if present and integral.
    pub fn sequence(&self) -> Option<i64> {
        self.get_i64(Self::SEQUENCE_FIELD)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    /// Look up a nested value by JSON pointer, e.g. `/data/BlockAdded/block_hash`.
    ///
    /// Follows RFC 6901: the pointer starts with `/`, and `~1` and `~0` in a
    /// segment stand for `/` and `~`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let path = pointer.strip_prefix('/')?;
        let (head, rest) = match path.split_once('/') {
            Some((head, _)) => (head, Some(&path[head.len()..])),
            None => (path, None),
        };
        let value = self.0.get(&unescape_segment(head))?;
        match rest {
            Some(rest) => value.pointer(rest),
            None => Some(value),
        }
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Serialize to compact JSON text.
    pub fn to_json_string(&self) -> String {
        // A map of JSON values always serializes.
        Value::Object(self.0.clone()).to_string()
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A persisted document and the identifier the backend assigned to it.
///
/// `body` holds exactly the fields that were saved; the id is kept apart so
/// that saved and retrieved bodies compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub body: Document,
}

impl StoredDocument {
    pub fn new(id: DocumentId, body: Document) -> Self {
        Self { id, body }
    }

    /// Render the body with the id added under `_id`.
    pub fn to_json(&self) -> Value {
        let mut map = self.body.as_map().clone();
        map.insert(Document::ID_FIELD.to_string(), Value::String(self.id.to_hex()));
        Value::Object(map)
    }
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
