//! Error types for Nimbus.

use thiserror::Error;

/// Common error type for Nimbus.
#[derive(Error, Debug)]
pub enum NimbusError {
    /// Database error.
    ///
    /// This is a generic database error that wraps errors from any database
    /// backend. Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Share link past its expiry time. Distinct from NotFound so callers
    /// can tell an expired link apart from an unknown or revoked one.
    #[error("{0} has expired")]
    Expired(String),

    /// Metadata exists but the backing object is missing from storage.
    ///
    /// Reported to callers as NotFound; kept as its own variant so the
    /// integrity failure can be logged distinctly.
    #[error("storage inconsistency: {0}")]
    StorageInconsistency(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for NimbusError {
    fn from(e: sqlx::Error) -> Self {
        NimbusError::Database(e.to_string())
    }
}

/// Result type alias for Nimbus operations.
pub type Result<T> = std::result::Result<T, NimbusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = NimbusError::Auth("invalid token".to_string());
        assert_eq!(err.to_string(), "authentication error: invalid token");
    }

    #[test]
    fn test_validation_error_display() {
        let err = NimbusError::Validation("name too long".to_string());
        assert_eq!(err.to_string(), "validation error: name too long");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = NimbusError::NotFound("file".to_string());
        assert_eq!(err.to_string(), "file not found");
    }

    #[test]
    fn test_expired_error_display() {
        let err = NimbusError::Expired("share link".to_string());
        assert_eq!(err.to_string(), "share link has expired");
    }

    #[test]
    fn test_storage_inconsistency_display() {
        let err = NimbusError::StorageInconsistency("object missing for file 3".to_string());
        assert!(err.to_string().contains("storage inconsistency"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NimbusError = io_err.into();
        assert!(matches!(err, NimbusError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(NimbusError::Auth("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
