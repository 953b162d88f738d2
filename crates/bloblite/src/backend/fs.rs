//! Filesystem blob backend
//!
//! Each container is a directory under the backend root. A blob is stored as
//! a metadata file named after the BLAKE3 hash of the blob name, plus one
//! content file per committed version:
//!
//! ```text
//! <root>/<container>/<hash>.meta.json       ETag, content type, content file
//! <root>/<container>/<hash>.<generation>.blob  content
//! ```
//!
//! Hashing the name lets any blob name (including `/`) map onto a single
//! file. The metadata file is authoritative for existence, and renaming it
//! into place is the commit point of a write: content that no metadata file
//! points at is never served.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use super::{BackendError, BlobBackend, ContentType, DownloadedText};
use crate::etag::ETag;

/// Per-blob locks shared by every `FsBackend` in the process
///
/// Keyed by the canonical metadata path, so two backends opened on the same
/// root (or on different spellings of it) serialize against each other.
static BLOB_LOCKS: LazyLock<DashMap<PathBuf, Arc<Mutex<()>>>> = LazyLock::new(DashMap::new);

/// Exclusive hold on one blob
///
/// The lock table entry is dropped on release once nobody else holds or
/// waits for it.
struct BlobLock {
    key: PathBuf,
    guard: Option<OwnedMutexGuard<()>>,
}

impl BlobLock {
    async fn acquire(key: PathBuf) -> Self {
        let lock = BLOB_LOCKS.entry(key.clone()).or_default().value().clone();
        let guard = lock.lock_owned().await;
        Self {
            key,
            guard: Some(guard),
        }
    }
}

impl Drop for BlobLock {
    fn drop(&mut self) {
        // Release the mutex first so only the table's own reference remains
        self.guard.take();
        BLOB_LOCKS.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Metadata stored next to every blob
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobMeta {
    /// Blob name as given by the caller
    name: String,
    /// Current ETag
    etag: ETag,
    /// Declared content type
    content_type: ContentType,
    /// Number of writes since the blob was created
    generation: u64,
    /// File in the container directory holding the current content
    content_file: String,
    /// Content size in bytes
    size: u64,
    /// Time of the last successful write
    last_modified: DateTime<Utc>,
}

/// Location of a blob's files
struct BlobPaths {
    dir: PathBuf,
    hash: String,
    meta: PathBuf,
}

impl BlobPaths {
    fn new(dir: PathBuf, name: &str) -> Self {
        let hash = blake3::hash(name.as_bytes()).to_hex().to_string();
        let meta = dir.join(format!("{hash}.meta.json"));
        Self { dir, hash, meta }
    }

    fn content_file_name(&self, generation: u64) -> String {
        format!("{}.{generation}.blob", self.hash)
    }

    fn content(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

/// Filesystem implementation of BlobBackend
///
/// Conditional writes are serialized per blob with a process-wide lock, so
/// the ETag check and the write happen atomically with respect to every
/// other `FsBackend` in the same process. Separate processes sharing a root
/// are not coordinated.
#[derive(Debug)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Create a backend rooted at `root`
    ///
    /// No I/O happens here; the root directory is created together with the
    /// first container.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        info!(root = %root.display(), "Filesystem blob backend opened");

        Self { root }
    }

    /// Root directory of the backend
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, BackendError> {
        if container == "."
            || container == ".."
            || container.contains(['/', '\\', '\0'])
        {
            return Err(BackendError::invalid_name(format!(
                "container name {container:?} is not a single path segment"
            )));
        }
        Ok(self.root.join(container))
    }

    /// Resolve a blob inside an existing container to canonical paths
    async fn locate(&self, container: &str, name: &str) -> Result<BlobPaths, BackendError> {
        let dir = match fs::canonicalize(self.container_dir(container)?).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BackendError::container_not_found(container));
            }
            Err(e) => return Err(e.into()),
        };

        if !Self::is_dir(&dir).await? {
            return Err(BackendError::container_not_found(container));
        }
        Ok(BlobPaths::new(dir, name))
    }

    async fn is_dir(path: &Path) -> Result<bool, BackendError> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_meta(path: &Path) -> Result<Option<BlobMeta>, BackendError> {
        match fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                BackendError::invalid_content(format!(
                    "corrupt metadata {}: {e}",
                    path.display()
                ))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a uniquely named temp file in `dir`, then rename over `path`
    ///
    /// The temp file is removed if anything fails before the rename.
    async fn write_atomic(dir: &Path, path: &Path, data: &[u8]) -> Result<(), BackendError> {
        let (file, temp_path) = tempfile::Builder::new()
            .prefix(".bloblite-")
            .suffix(".tmp")
            .tempfile_in(dir)?
            .into_parts();

        let mut file = File::from_std(file);
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        temp_path.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    async fn remove_if_exists(path: &Path) -> Result<bool, BackendError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobBackend for FsBackend {
    async fn container_exists(&self, container: &str) -> Result<bool, BackendError> {
        Self::is_dir(&self.container_dir(container)?).await
    }

    async fn create_container(&self, container: &str) -> Result<(), BackendError> {
        let dir = self.container_dir(container)?;
        fs::create_dir_all(&dir).await?;
        debug!(path = %dir.display(), "Created container directory");
        Ok(())
    }

    async fn blob_exists(&self, container: &str, name: &str) -> Result<bool, BackendError> {
        let paths = BlobPaths::new(self.container_dir(container)?, name);
        Ok(fs::try_exists(&paths.meta).await?)
    }

    #[instrument(skip(self))]
    async fn download_text(
        &self,
        container: &str,
        name: &str,
    ) -> Result<DownloadedText, BackendError> {
        let paths = self.locate(container, name).await?;
        let _lock = BlobLock::acquire(paths.meta.clone()).await;

        let meta = Self::read_meta(&paths.meta)
            .await?
            .ok_or_else(|| BackendError::blob_not_found(container, name))?;

        let bytes = match fs::read(paths.content(&meta.content_file)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BackendError::blob_not_found(container, name));
            }
            Err(e) => return Err(e.into()),
        };

        let text = String::from_utf8(bytes).map_err(|_| {
            BackendError::invalid_content(format!("{container}/{name} is not valid UTF-8"))
        })?;

        Ok(DownloadedText {
            text,
            etag: meta.etag,
            content_type: meta.content_type,
        })
    }

    #[instrument(skip(self, text), fields(size = text.len()))]
    async fn upload_text(
        &self,
        container: &str,
        name: &str,
        text: &str,
        content_type: ContentType,
        if_match: Option<&ETag>,
    ) -> Result<ETag, BackendError> {
        let paths = self.locate(container, name).await?;
        let _lock = BlobLock::acquire(paths.meta.clone()).await;

        let current = Self::read_meta(&paths.meta).await?;

        if let Some(expected) = if_match
            && current.as_ref().map(|meta| &meta.etag) != Some(expected)
        {
            debug!(expected = %expected, "ETag mismatch");
            return Err(BackendError::precondition_failed(container, name, expected));
        }

        let generation = current.as_ref().map_or(1, |meta| meta.generation + 1);
        let etag = ETag::next_version(text.as_bytes(), generation);
        let content_file = paths.content_file_name(generation);

        let meta = BlobMeta {
            name: name.to_string(),
            etag: etag.clone(),
            content_type,
            generation,
            content_file: content_file.clone(),
            size: text.len() as u64,
            last_modified: Utc::now(),
        };
        let meta_bytes = serde_json::to_vec(&meta)
            .map_err(|e| BackendError::invalid_content(e.to_string()))?;

        let content_path = paths.content(&content_file);
        Self::write_atomic(&paths.dir, &content_path, text.as_bytes()).await?;

        if let Err(e) = Self::write_atomic(&paths.dir, &paths.meta, &meta_bytes).await {
            // Not committed: the previous version stays current
            if let Err(cleanup) = Self::remove_if_exists(&content_path).await {
                warn!(error = %cleanup, "Failed to remove uncommitted content");
            }
            return Err(e);
        }

        if let Some(previous) = current
            && previous.content_file != content_file
            && let Err(e) = Self::remove_if_exists(&paths.content(&previous.content_file)).await
        {
            warn!(error = %e, "Failed to remove superseded content");
        }

        debug!(etag = %etag, generation, "Stored blob");
        Ok(etag)
    }

    #[instrument(skip(self))]
    async fn delete_if_exists(&self, container: &str, name: &str) -> Result<bool, BackendError> {
        let paths = self.locate(container, name).await?;
        let _lock = BlobLock::acquire(paths.meta.clone()).await;

        let Some(meta) = Self::read_meta(&paths.meta).await? else {
            return Ok(false);
        };

        // Metadata goes first so the blob stops existing before its content
        Self::remove_if_exists(&paths.meta).await?;
        Self::remove_if_exists(&paths.content(&meta.content_file)).await?;

        debug!("Deleted blob");
        Ok(true)
    }
}
