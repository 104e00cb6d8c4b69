//! Core types for the seismic review library
//!
//! Shared timestamp alias, the library-wide error type and the `Result` alias
//! used by every operation that can fail.

use chrono::{DateTime, Utc};

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Event identifier (matches the storage primary key)
pub type EventId = i64;

/// Result type for review operations
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Errors that can occur while reviewing or persisting events
///
/// Domain errors (`NotFound`, `Validation`, `InvalidAction`, `InvalidState`)
/// are always raised before any mutation takes place.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Event not found: {0}")]
    NotFound(EventId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Corrupt stored data: {0}")]
    Corrupt(String),
}

impl ReviewError {
    /// True for errors produced by the domain rules rather than storage
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            ReviewError::NotFound(_)
                | ReviewError::Validation(_)
                | ReviewError::InvalidAction(_)
                | ReviewError::InvalidState { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ReviewError::NotFound(23).to_string(), "Event not found: 23");
        assert_eq!(
            ReviewError::InvalidAction("Archivar".into()).to_string(),
            "Invalid action: Archivar"
        );

        let err = ReviewError::InvalidState {
            expected: "AutoDetected".into(),
            actual: "Confirmed".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid state: expected AutoDetected, found Confirmed"
        );
    }

    #[test]
    fn test_domain_error_classification() {
        assert!(ReviewError::Validation("x".into()).is_domain_error());
        assert!(!ReviewError::Corrupt("x".into()).is_domain_error());
    }
}
