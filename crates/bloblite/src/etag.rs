//! Entity tags

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Opaque version token a backend assigns to a blob on every successful write
///
/// Two ETags are equal only if they are byte-for-byte identical; callers should
/// never parse or construct them except to hand a previously observed value back
/// as a write precondition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    /// Wrap a raw tag value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derive a fresh tag for a new version of a blob
    ///
    /// `generation` must differ between successive writes of the same blob.
    /// A process-wide sequence number, the process id and the current time
    /// are mixed in as well, so a blob that is deleted and recreated never
    /// reuses an earlier tag even though its generation starts over.
    pub fn next_version(content: &[u8], generation: u64) -> Self {
        static SEQUENCE: AtomicU64 = AtomicU64::new(0);

        let mut hasher = blake3::Hasher::new();
        hasher.update(content);
        hasher.update(&generation.to_le_bytes());
        hasher.update(&SEQUENCE.fetch_add(1, Ordering::Relaxed).to_le_bytes());
        hasher.update(&std::process::id().to_le_bytes());
        let now = Utc::now();
        hasher.update(&now.timestamp().to_le_bytes());
        hasher.update(&now.timestamp_subsec_nanos().to_le_bytes());
        let hash = hasher.finalize();

        Self(format!("\"0x{}\"", hex::encode_upper(&hash.as_bytes()[..8])))
    }

    /// Get the raw tag value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the tag is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the tag and return the raw value
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ETag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ETag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
