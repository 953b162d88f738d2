//! The BlobLite client

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::backend::{BackendError, BlobBackend, ContentType};
use crate::config::BlobLiteConfig;
use crate::connection::ConnectionDescriptor;
use crate::error::{BlobLiteError, BlobLiteResult};
use crate::etag::ETag;
use crate::result::BlobOperationResult;

/// Reject empty or whitespace-only string parameters
fn validate_parameter(value: &str, param: &'static str) -> BlobLiteResult<()> {
    if value.trim().is_empty() {
        return Err(BlobLiteError::invalid_argument(param));
    }
    Ok(())
}

fn validate_target(container_name: &str, blob_name: &str) -> BlobLiteResult<()> {
    validate_parameter(container_name, "container_name")?;
    validate_parameter(blob_name, "blob_name")
}

/// A simple lightweight blob client
///
/// Holds only a backend handle; every operation is independent and may run
/// concurrently with any other. Share one instance through an `Arc` (see
/// [`ClientRegistry`](crate::ClientRegistry)).
#[derive(Clone)]
pub struct BlobLiteClient {
    backend: Arc<dyn BlobBackend>,
}

impl fmt::Debug for BlobLiteClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobLiteClient")
            .field("backend", &self.backend)
            .finish()
    }
}

impl BlobLiteClient {
    /// Create a client from a connection string
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the string is empty or whitespace,
    /// `InvalidConnectionString` if it names no known backend. No I/O is
    /// performed either way.
    pub fn new(connection_string: &str) -> BlobLiteResult<Self> {
        validate_parameter(connection_string, "connection_string")?;
        let descriptor: ConnectionDescriptor = connection_string.parse()?;
        Ok(Self::from_descriptor(&descriptor))
    }

    /// Create a client from an already parsed connection string
    pub fn from_descriptor(descriptor: &ConnectionDescriptor) -> Self {
        debug!(connection = %descriptor, "Creating blob client");
        Self::with_backend(descriptor.open())
    }

    /// Create a client from a configuration object
    pub fn from_config(config: &BlobLiteConfig) -> BlobLiteResult<Self> {
        Self::new(&config.connection_string)
    }

    /// Create a client over an existing backend
    pub fn with_backend(backend: Arc<dyn BlobBackend>) -> Self {
        Self { backend }
    }

    /// The backend this client forwards to
    pub fn backend(&self) -> &Arc<dyn BlobBackend> {
        &self.backend
    }

    /// Download a blob's text if both container and blob exist
    async fn try_download(
        &self,
        container_name: &str,
        blob_name: &str,
    ) -> BlobLiteResult<Option<BlobOperationResult<String>>> {
        if !self.backend.container_exists(container_name).await? {
            debug!("Container does not exist");
            return Ok(None);
        }

        if !self.backend.blob_exists(container_name, blob_name).await? {
            debug!("Blob does not exist");
            return Ok(None);
        }

        match self.backend.download_text(container_name, blob_name).await {
            Ok(downloaded) => Ok(Some(BlobOperationResult::new(
                downloaded.text,
                downloaded.etag,
            ))),
            // Removed between the existence check and the read
            Err(e) if e.is_not_found() => {
                debug!(error = %e, "Blob disappeared before download");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Upload text, creating the container first when asked to
    async fn upload(
        &self,
        container_name: &str,
        blob_name: &str,
        text: &str,
        content_type: ContentType,
        create_container_if_missing: bool,
        etag: Option<&ETag>,
    ) -> BlobLiteResult<BlobOperationResult> {
        if create_container_if_missing && !self.backend.container_exists(container_name).await? {
            debug!("Creating missing container");
            self.backend.create_container(container_name).await?;
        }

        match self
            .backend
            .upload_text(container_name, blob_name, text, content_type, etag)
            .await
        {
            Ok(new_etag) => {
                debug!(etag = %new_etag, "Saved blob");
                Ok(BlobOperationResult::from_etag(new_etag))
            }
            Err(e @ BackendError::PreconditionFailed { .. }) => {
                warn!(error = %e, "Conditional save rejected");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Try to load plain text from the specified blob
    ///
    /// Returns `Ok(None)` if the container or the blob does not exist.
    #[instrument(skip(self))]
    pub async fn try_load_plain_text(
        &self,
        container_name: &str,
        blob_name: &str,
    ) -> BlobLiteResult<Option<BlobOperationResult<String>>> {
        validate_target(container_name, blob_name)?;
        self.try_download(container_name, blob_name).await
    }

    /// Try to save `plain_text` to the specified blob as `text/plain`
    ///
    /// With `create_container_if_missing` the container is created first when
    /// absent; otherwise saving into a missing container fails with
    /// `ContainerNotFound`. Passing an `etag` makes the write conditional: it
    /// only succeeds if the stored blob still carries that exact ETag.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for empty names, `PreconditionFailed` on an ETag
    /// mismatch, or any other backend failure.
    #[instrument(skip(self, plain_text), fields(size = plain_text.len()))]
    pub async fn try_save_plain_text(
        &self,
        container_name: &str,
        blob_name: &str,
        plain_text: &str,
        create_container_if_missing: bool,
        etag: Option<&ETag>,
    ) -> BlobLiteResult<BlobOperationResult> {
        validate_target(container_name, blob_name)?;
        self.upload(
            container_name,
            blob_name,
            plain_text,
            ContentType::PlainText,
            create_container_if_missing,
            etag,
        )
        .await
    }

    /// Try to load a value from JSON stored in the specified blob
    ///
    /// Returns `Ok(None)` if the container or the blob does not exist.
    ///
    /// # Errors
    ///
    /// `Deserialization` if the content is not valid JSON for `T`.
    #[instrument(skip(self), fields(payload = std::any::type_name::<T>()))]
    pub async fn try_load_from_json<T: DeserializeOwned>(
        &self,
        container_name: &str,
        blob_name: &str,
    ) -> BlobLiteResult<Option<BlobOperationResult<T>>> {
        validate_target(container_name, blob_name)?;

        let Some(loaded) = self.try_download(container_name, blob_name).await? else {
            return Ok(None);
        };

        let (json, etag) = loaded.into_parts();
        let value = serde_json::from_str(&json).map_err(|e| {
            BlobLiteError::deserialization(format!("{container_name}/{blob_name}: {e}"))
        })?;

        Ok(Some(BlobOperationResult::new(value, etag)))
    }

    /// Try to save `data` as JSON to the specified blob as `application/json`
    ///
    /// Container creation and ETag handling are the same as for
    /// [`try_save_plain_text`](Self::try_save_plain_text).
    #[instrument(skip(self, data))]
    pub async fn try_save_as_json<T: Serialize + ?Sized>(
        &self,
        container_name: &str,
        blob_name: &str,
        data: &T,
        create_container_if_missing: bool,
        etag: Option<&ETag>,
    ) -> BlobLiteResult<BlobOperationResult> {
        validate_target(container_name, blob_name)?;

        let json =
            serde_json::to_string(data).map_err(|e| BlobLiteError::serialization(e.to_string()))?;

        self.upload(
            container_name,
            blob_name,
            &json,
            ContentType::Json,
            create_container_if_missing,
            etag,
        )
        .await
    }

    /// Try to delete the specified blob
    ///
    /// Deleting from a missing container or deleting a missing blob is a
    /// no-op.
    #[instrument(skip(self))]
    pub async fn try_delete_blob(&self, container_name: &str, blob_name: &str) -> BlobLiteResult<()> {
        validate_target(container_name, blob_name)?;

        if !self.backend.container_exists(container_name).await? {
            debug!("Container does not exist");
            return Ok(());
        }

        match self.backend.delete_if_exists(container_name, blob_name).await {
            Ok(deleted) => {
                debug!(deleted, "Delete finished");
                Ok(())
            }
            Err(BackendError::ContainerNotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
