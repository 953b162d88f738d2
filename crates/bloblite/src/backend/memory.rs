//! In-memory blob backend
//!
//! Suitable for testing, simulation and `memory://` connection strings.
//! Content lives only as long as the backend instance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, trace};

use super::{BackendError, BlobBackend, ContentType, DownloadedText};
use crate::etag::ETag;

/// A stored blob version
#[derive(Debug, Clone)]
struct StoredBlob {
    text: String,
    etag: ETag,
    content_type: ContentType,
}

/// In-memory implementation of BlobBackend
///
/// Uses `DashMap` keyed by container name. Each upload holds the container's
/// shard lock for the duration of its ETag check and write, which makes the
/// conditional write atomic per blob.
#[derive(Debug)]
pub struct InMemoryBackend {
    /// Map from container name to its blobs
    containers: DashMap<String, HashMap<String, StoredBlob>>,
    /// Monotonic write counter, mixed into every ETag
    generation: AtomicU64,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Create a new, empty in-memory backend
    pub fn new() -> Self {
        Self {
            containers: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Number of containers
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Number of blobs in a container, or `None` if it does not exist
    pub fn blob_count(&self, container: &str) -> Option<usize> {
        self.containers.get(container).map(|blobs| blobs.len())
    }
}

#[async_trait]
impl BlobBackend for InMemoryBackend {
    async fn container_exists(&self, container: &str) -> Result<bool, BackendError> {
        Ok(self.containers.contains_key(container))
    }

    async fn create_container(&self, container: &str) -> Result<(), BackendError> {
        trace!(container, "Creating container");
        self.containers.entry(container.to_string()).or_default();
        Ok(())
    }

    async fn blob_exists(&self, container: &str, name: &str) -> Result<bool, BackendError> {
        Ok(self
            .containers
            .get(container)
            .is_some_and(|blobs| blobs.contains_key(name)))
    }

    async fn download_text(
        &self,
        container: &str,
        name: &str,
    ) -> Result<DownloadedText, BackendError> {
        let blobs = self
            .containers
            .get(container)
            .ok_or_else(|| BackendError::container_not_found(container))?;

        let blob = blobs
            .get(name)
            .ok_or_else(|| BackendError::blob_not_found(container, name))?;

        Ok(DownloadedText {
            text: blob.text.clone(),
            etag: blob.etag.clone(),
            content_type: blob.content_type,
        })
    }

    async fn upload_text(
        &self,
        container: &str,
        name: &str,
        text: &str,
        content_type: ContentType,
        if_match: Option<&ETag>,
    ) -> Result<ETag, BackendError> {
        let mut blobs = self
            .containers
            .get_mut(container)
            .ok_or_else(|| BackendError::container_not_found(container))?;

        if let Some(expected) = if_match {
            let current = blobs.get(name).map(|blob| &blob.etag);
            if current != Some(expected) {
                debug!(container, name, expected = %expected, "ETag mismatch");
                return Err(BackendError::precondition_failed(container, name, expected));
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let etag = ETag::next_version(text.as_bytes(), generation);

        blobs.insert(
            name.to_string(),
            StoredBlob {
                text: text.to_string(),
                etag: etag.clone(),
                content_type,
            },
        );

        trace!(container, name, etag = %etag, "Stored blob");
        Ok(etag)
    }

    async fn delete_if_exists(&self, container: &str, name: &str) -> Result<bool, BackendError> {
        let mut blobs = self
            .containers
            .get_mut(container)
            .ok_or_else(|| BackendError::container_not_found(container))?;

        Ok(blobs.remove(name).is_some())
    }
}
