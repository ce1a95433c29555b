//! Error types for the event audit core.

use thiserror::Error;

/// Errors raised while turning raw payloads into documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The payload is not valid JSON.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload is valid JSON but not an object.
    #[error("payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A required field is absent, empty, or has the wrong type.
    #[error("\"{0}\" must be present in the JSON")]
    MissingField(&'static str),

    /// A document identifier could not be parsed.
    #[error("invalid document id: {0}")]
    InvalidId(String),

    /// A label that names none of the known event types.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, DocumentError>;
