//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Message content is empty")]
    EmptyContent,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Store operation timed out after {0}ms")]
    Timeout(u64),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyContent => "EMPTY_CONTENT",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::Timeout(_) => "STORE_TIMEOUT",
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::EmptyContent.code(), "EMPTY_CONTENT");
        assert_eq!(DomainError::Timeout(5000).code(), "STORE_TIMEOUT");
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::EmptyContent.is_validation());
        assert!(!DomainError::DatabaseError("down".to_string()).is_validation());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::DatabaseError("connection refused".to_string());
        assert_eq!(err.to_string(), "Database error: connection refused");

        let err = DomainError::Timeout(5000);
        assert_eq!(err.to_string(), "Store operation timed out after 5000ms");
    }
}
