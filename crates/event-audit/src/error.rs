//! Error types for the audit service.

use event_audit_core::{DocumentError, EventType};
use event_audit_store::StoreError;
use thiserror::Error;

/// Errors that can occur during audit service operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The payload is not a JSON object. Not retryable.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A required field is missing. Not retryable.
    #[error("missing field: \"{0}\" must be present in the JSON")]
    MissingField(&'static str),

    /// The backend failed. May be transient; never retried here.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Index creation failed at start-up.
    #[error("failed to create index for {event_type}: {source}")]
    IndexCreation {
        event_type: EventType,
        #[source]
        source: StoreError,
    },
}

impl AuditError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuditError::Storage(_))
    }
}

impl From<DocumentError> for AuditError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::MissingField(field) => AuditError::MissingField(field),
            other => AuditError::MalformedInput(other.to_string()),
        }
    }
}

/// Result type for audit service operations.
pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_errors_map_to_input_errors() {
        let err: AuditError = DocumentError::MissingField("type").into();
        assert!(matches!(err, AuditError::MissingField("type")));

        let err: AuditError = DocumentError::NotAnObject("array").into();
        assert!(matches!(err, AuditError::MalformedInput(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_only_storage_errors_are_retryable() {
        let err = AuditError::Storage(StoreError::Task("cancelled".to_string()));
        assert!(err.is_retryable());

        let err = AuditError::IndexCreation {
            event_type: EventType::Main,
            source: StoreError::InvalidData("bad".to_string()),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("MAIN"));
    }
}
