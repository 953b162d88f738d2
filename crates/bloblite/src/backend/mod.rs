//! Blob storage backends
//!
//! [`BlobBackend`] is the seam between [`BlobLiteClient`](crate::BlobLiteClient)
//! and whatever actually stores blobs. Two implementations ship with the crate:
//!
//! - [`InMemoryBackend`]: process-local, for testing and `memory://`
//! - [`FsBackend`]: one directory per container, for `file://`
//!
//! A backend owns durability, concurrency control and ETag assignment. The
//! compare-and-swap behind `upload_text(.., Some(etag))` must be atomic for a
//! single blob.

mod fs;
mod memory;

pub use fs::FsBackend;
pub use memory::InMemoryBackend;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::etag::ETag;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The container does not exist
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// The blob does not exist
    #[error("Blob not found: {container}/{name}")]
    BlobNotFound { container: String, name: String },

    /// The stored ETag does not match the expected one
    #[error("Precondition failed for {container}/{name}: expected ETag {expected}")]
    PreconditionFailed {
        container: String,
        name: String,
        expected: ETag,
    },

    /// A container or blob name the backend cannot represent
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Stored content is not what the operation expects (e.g. not UTF-8)
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// I/O error in the backend
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl BackendError {
    /// Create a new ContainerNotFound error
    pub fn container_not_found(container: impl Into<String>) -> Self {
        Self::ContainerNotFound(container.into())
    }

    /// Create a new BlobNotFound error
    pub fn blob_not_found(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self::BlobNotFound {
            container: container.into(),
            name: name.into(),
        }
    }

    /// Create a new PreconditionFailed error
    pub fn precondition_failed(
        container: impl Into<String>,
        name: impl Into<String>,
        expected: &ETag,
    ) -> Self {
        Self::PreconditionFailed {
            container: container.into(),
            name: name.into(),
            expected: expected.clone(),
        }
    }

    /// Create a new InvalidName error
    pub fn invalid_name(message: impl Into<String>) -> Self {
        Self::InvalidName(message.into())
    }

    /// Create a new InvalidContent error
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent(message.into())
    }

    /// Whether the error means the container or blob is missing
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ContainerNotFound(_) | Self::BlobNotFound { .. }
        )
    }
}

/// Declared content type of a stored blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// `text/plain`
    #[serde(rename = "text/plain")]
    PlainText,
    /// `application/json`
    #[serde(rename = "application/json")]
    Json,
}

impl ContentType {
    /// MIME type string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::PlainText => "text/plain",
            ContentType::Json => "application/json",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text content downloaded from a backend together with its current version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedText {
    /// Blob content
    pub text: String,
    /// ETag of the version that was read
    pub etag: ETag,
    /// Content type recorded at upload
    pub content_type: ContentType,
}

/// Storage backend used by [`BlobLiteClient`](crate::BlobLiteClient)
///
/// All methods are independent units of async work; implementations must be
/// safe to call concurrently from many tasks.
#[async_trait]
pub trait BlobBackend: Send + Sync + fmt::Debug {
    /// Check whether a container exists
    async fn container_exists(&self, container: &str) -> Result<bool, BackendError>;

    /// Create a container
    ///
    /// Creating a container that already exists is not an error.
    async fn create_container(&self, container: &str) -> Result<(), BackendError>;

    /// Check whether a blob exists inside a container
    ///
    /// Returns `Ok(false)` when the container itself is missing.
    async fn blob_exists(&self, container: &str, name: &str) -> Result<bool, BackendError>;

    /// Download a blob as text together with its current ETag
    ///
    /// # Errors
    ///
    /// `ContainerNotFound` or `BlobNotFound` if the target is missing.
    async fn download_text(&self, container: &str, name: &str)
    -> Result<DownloadedText, BackendError>;

    /// Upload text, creating or replacing the blob, and return the new ETag
    ///
    /// When `if_match` is `Some`, the write only happens if the blob exists
    /// and its stored ETag equals the given one exactly; otherwise
    /// `PreconditionFailed` is returned and nothing is modified.
    ///
    /// # Errors
    ///
    /// `ContainerNotFound` if the container does not exist.
    async fn upload_text(
        &self,
        container: &str,
        name: &str,
        text: &str,
        content_type: ContentType,
        if_match: Option<&ETag>,
    ) -> Result<ETag, BackendError>;

    /// Delete a blob if it exists
    ///
    /// Returns whether a blob was removed.
    ///
    /// # Errors
    ///
    /// `ContainerNotFound` if the container does not exist.
    async fn delete_if_exists(&self, container: &str, name: &str) -> Result<bool, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the BlobBackend trait is object-safe
    fn _assert_object_safe(_: &dyn BlobBackend) {}

    #[test]
    fn test_content_type_strings() {
        assert_eq!(ContentType::PlainText.as_str(), "text/plain");
        assert_eq!(ContentType::Json.to_string(), "application/json");
    }

    #[test]
    fn test_content_type_serde() {
        let json = serde_json::to_string(&ContentType::Json).unwrap();
        assert_eq!(json, "\"application/json\"");

        let parsed: ContentType = serde_json::from_str("\"text/plain\"").unwrap();
        assert_eq!(parsed, ContentType::PlainText);
    }

    #[test]
    fn test_not_found_classification() {
        assert!(BackendError::container_not_found("c").is_not_found());
        assert!(BackendError::blob_not_found("c", "b").is_not_found());
        assert!(!BackendError::invalid_name("..").is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BackendError = io_err.into();
        assert!(matches!(err, BackendError::Io(_)));
    }
}
