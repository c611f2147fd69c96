//! Error types for annota.

use thiserror::Error;

/// Result type alias using annota's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for annota operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Input failed validation before any I/O was issued
    #[error("Validation error: {0}")]
    Validation(String),

    /// Search operation failed (both FTS and the fallback scan)
    #[error("Search error: {0}")]
    Search(String),

    /// Mutation queue error
    #[error("Queue error: {0}")]
    Queue(String),

    /// Offline storage adapter error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication/authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("query too short".to_string());
        assert_eq!(err.to_string(), "Validation error: query too short");
    }

    #[test]
    fn test_error_display_search() {
        let err = Error::Search("search unavailable".to_string());
        assert_eq!(err.to_string(), "Search error: search unavailable");
    }

    #[test]
    fn test_error_display_queue() {
        let err = Error::Queue("batch rejected".to_string());
        assert_eq!(err.to_string(), "Queue error: batch rejected");
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("adapter write failed".to_string());
        assert_eq!(err.to_string(), "Storage error: adapter write failed");
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("no user in context".to_string());
        assert_eq!(err.to_string(), "Unauthorized: no user in context");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
