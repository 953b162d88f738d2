//! # BlobLite
//!
//! A lightweight blob client with ETag-based optimistic concurrency.
//!
//! BlobLite loads and saves plain text or JSON documents stored as blobs inside
//! named containers. Storage itself is delegated to a [`BlobBackend`]; the client
//! validates arguments, turns "does not exist" into `None`, and forwards calls.
//!
//! ## Features
//!
//! - **BlobLiteClient**: load/save plain text, load/save JSON, delete
//! - **ETag preconditions**: conditional writes that fail on a stale version
//! - **InMemoryBackend**: process-local backend for tests and `memory://`
//! - **FsBackend**: directory-per-container backend for `file://`
//! - **ClientRegistry**: one shared client per connection string
//!
//! ## Example
//!
//! ```rust,ignore
//! use bloblite::BlobLiteClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bloblite::BlobLiteError> {
//!     let client = BlobLiteClient::new("memory://")?;
//!
//!     let saved = client
//!         .try_save_plain_text("notes", "hello.txt", "Hello!", true, None)
//!         .await?;
//!
//!     let loaded = client.try_load_plain_text("notes", "hello.txt").await?;
//!     assert_eq!(loaded.unwrap().etag(), saved.etag());
//!
//!     // Writing with a superseded ETag is rejected
//!     client
//!         .try_save_plain_text("notes", "hello.txt", "v2", false, Some(saved.etag()))
//!         .await?;
//!     let stale = client
//!         .try_save_plain_text("notes", "hello.txt", "v3", false, Some(saved.etag()))
//!         .await;
//!     assert!(stale.unwrap_err().is_precondition_failed());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod etag;
pub mod registry;
pub mod result;

// Re-exports
pub use backend::{
    BackendError, BlobBackend, ContentType, DownloadedText, FsBackend, InMemoryBackend,
};
pub use client::BlobLiteClient;
pub use config::{BlobLiteConfig, CONNECTION_STRING_ENV};
pub use connection::ConnectionDescriptor;
pub use error::{BlobLiteError, BlobLiteResult};
pub use etag::ETag;
pub use registry::ClientRegistry;
pub use result::BlobOperationResult;
