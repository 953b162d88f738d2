//! Connection string parsing
//!
//! A connection string names the backend a client talks to:
//!
//! - `memory://` or `memory://<label>`: a fresh [`InMemoryBackend`]
//! - `file://<path>`: an [`FsBackend`] rooted at `<path>`
//!
//! Surrounding whitespace is ignored and the scheme is case-insensitive.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::backend::{BlobBackend, FsBackend, InMemoryBackend};
use crate::error::BlobLiteError;

const MEMORY_SCHEME: &str = "memory://";
const FILE_SCHEME: &str = "file://";

/// Parsed connection string
///
/// Equality follows what the string means, not how it is spelled: the scheme
/// is case-insensitive and file roots compare by path components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConnectionDescriptor {
    /// Process-local storage, optionally labelled for diagnostics
    Memory { label: Option<String> },
    /// Directory-backed storage
    FileSystem { root: PathBuf },
}

impl ConnectionDescriptor {
    /// Open a backend handle for this descriptor
    ///
    /// Opening never performs I/O.
    pub fn open(&self) -> Arc<dyn BlobBackend> {
        match self {
            ConnectionDescriptor::Memory { .. } => Arc::new(InMemoryBackend::new()),
            ConnectionDescriptor::FileSystem { root } => Arc::new(FsBackend::new(root.clone())),
        }
    }
}

fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let prefix = value.get(..scheme.len())?;
    prefix
        .eq_ignore_ascii_case(scheme)
        .then(|| &value[scheme.len()..])
}

impl FromStr for ConnectionDescriptor {
    type Err = BlobLiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Err(BlobLiteError::invalid_argument("connection_string"));
        }

        if let Some(rest) = strip_scheme(value, MEMORY_SCHEME) {
            let label = (!rest.is_empty()).then(|| rest.to_string());
            return Ok(ConnectionDescriptor::Memory { label });
        }

        if let Some(rest) = strip_scheme(value, FILE_SCHEME) {
            if rest.is_empty() {
                return Err(BlobLiteError::invalid_connection_string(
                    "file:// requires a directory path",
                ));
            }
            return Ok(ConnectionDescriptor::FileSystem {
                root: PathBuf::from(rest),
            });
        }

        Err(BlobLiteError::invalid_connection_string(format!(
            "unsupported scheme in {value:?} (expected memory:// or file://)"
        )))
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionDescriptor::Memory { label: None } => write!(f, "{MEMORY_SCHEME}"),
            ConnectionDescriptor::Memory { label: Some(label) } => {
                write!(f, "{MEMORY_SCHEME}{label}")
            }
            ConnectionDescriptor::FileSystem { root } => {
                write!(f, "{FILE_SCHEME}{}", root.display())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory() {
        let parsed: ConnectionDescriptor = "memory://".parse().unwrap();
        assert_eq!(parsed, ConnectionDescriptor::Memory { label: None });

        let parsed: ConnectionDescriptor = "  MEMORY://cache  ".parse().unwrap();
        assert_eq!(
            parsed,
            ConnectionDescriptor::Memory {
                label: Some("cache".into())
            }
        );
    }

    #[test]
    fn test_parse_file() {
        let parsed: ConnectionDescriptor = "file:///var/lib/bloblite".parse().unwrap();
        assert_eq!(
            parsed,
            ConnectionDescriptor::FileSystem {
                root: PathBuf::from("/var/lib/bloblite")
            }
        );
        assert_eq!(parsed.to_string(), "file:///var/lib/bloblite");
    }

    #[test]
    fn test_equivalent_spellings_are_equal() {
        let a: ConnectionDescriptor = "memory://shared".parse().unwrap();
        let b: ConnectionDescriptor = "MEMORY://shared".parse().unwrap();
        assert_eq!(a, b);

        let a: ConnectionDescriptor = "file:///data/blobs".parse().unwrap();
        let b: ConnectionDescriptor = " FILE:///data/blobs/ ".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_empty_is_invalid_argument() {
        for input in ["", "   ", "\t\n"] {
            let err = input.parse::<ConnectionDescriptor>().unwrap_err();
            assert!(err.is_invalid_argument(), "{input:?}");
        }
    }

    #[test]
    fn test_parse_unknown_scheme() {
        let err = "DefaultEndpointsProtocol=https;AccountName=x"
            .parse::<ConnectionDescriptor>()
            .unwrap_err();
        assert!(matches!(err, BlobLiteError::InvalidConnectionString(_)));

        let err = "file://".parse::<ConnectionDescriptor>().unwrap_err();
        assert!(matches!(err, BlobLiteError::InvalidConnectionString(_)));
    }
}
