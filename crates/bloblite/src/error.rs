//! Error types for bloblite
//!
//! Client-level failures live in [`BlobLiteError`]. Failures raised by a
//! storage backend are [`BackendError`]s and reach the caller unchanged through
//! the transparent [`BlobLiteError::Backend`] variant.

use thiserror::Error;

pub use crate::backend::BackendError;

/// Errors that can occur in client operations
#[derive(Debug, Error)]
pub enum BlobLiteError {
    /// A required string parameter was empty or whitespace only
    #[error("{param} cannot be null or empty")]
    InvalidArgument {
        /// Name of the offending parameter
        param: &'static str,
    },

    /// The connection string could not be mapped to a backend
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value could not be encoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored content is not valid JSON for the requested type
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Failure reported by the storage backend
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl BlobLiteError {
    /// Create a new InvalidArgument error
    pub fn invalid_argument(param: &'static str) -> Self {
        Self::InvalidArgument { param }
    }

    /// Create a new InvalidConnectionString error
    pub fn invalid_connection_string(message: impl Into<String>) -> Self {
        Self::InvalidConnectionString(message.into())
    }

    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a new Deserialization error
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization(message.into())
    }

    /// Whether this is a caller error raised before any backend call
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Whether a conditional write was rejected because of an ETag mismatch
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::Backend(BackendError::PreconditionFailed { .. }))
    }
}

/// Result type alias for client operations
pub type BlobLiteResult<T> = Result<T, BlobLiteError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ETag;

    #[test]
    fn test_invalid_argument_error() {
        let err = BlobLiteError::invalid_argument("container_name");
        assert!(err.is_invalid_argument());
        assert!(!err.is_precondition_failed());
        assert_eq!(err.to_string(), "container_name cannot be null or empty");
    }

    #[test]
    fn test_backend_error_is_transparent() {
        let backend = BackendError::container_not_found("photos");
        let expected = backend.to_string();
        let err: BlobLiteError = backend.into();
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_precondition_failed_detection() {
        let err: BlobLiteError = BackendError::PreconditionFailed {
            container: "docs".into(),
            name: "a.txt".into(),
            expected: ETag::from("\"0x1\""),
        }
        .into();
        assert!(err.is_precondition_failed());
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_deserialization_error() {
        let err = BlobLiteError::deserialization("expected value at line 1");
        assert!(matches!(err, BlobLiteError::Deserialization(_)));
        assert!(err.to_string().contains("line 1"));
    }
}
