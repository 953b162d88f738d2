//! Client configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BlobLiteError;

/// Environment variable read by [`BlobLiteConfig::from_env`]
pub const CONNECTION_STRING_ENV: &str = "BLOBLITE_CONNECTION_STRING";

/// Configuration for a [`BlobLiteClient`](crate::BlobLiteClient)
///
/// The connection string is validated when a client is built from it, not
/// here, so an empty config can be deserialized and filled in later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobLiteConfig {
    /// Connection string naming the backend
    pub connection_string: String,
}

impl BlobLiteConfig {
    /// Create a config for the given connection string
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }

    /// Read the connection string from `BLOBLITE_CONNECTION_STRING`
    pub fn from_env() -> Result<Self, BlobLiteError> {
        std::env::var(CONNECTION_STRING_ENV)
            .map(Self::new)
            .map_err(|e| BlobLiteError::config(format!("{CONNECTION_STRING_ENV}: {e}")))
    }

    /// Parse a TOML document with a top-level `connection_string` key
    pub fn from_toml_str(s: &str) -> Result<Self, BlobLiteError> {
        toml::from_str(s).map_err(|e| BlobLiteError::config(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BlobLiteError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BlobLiteError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Set the connection string
    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = connection_string.into();
        self
    }
}
