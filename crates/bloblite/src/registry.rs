//! Shared client registry
//!
//! Embedding applications keep one [`BlobLiteClient`] per connection and hand
//! out clones of the same `Arc` to every component that needs it.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::client::BlobLiteClient;
use crate::config::BlobLiteConfig;
use crate::connection::ConnectionDescriptor;
use crate::error::BlobLiteResult;

/// One shared client per connection
///
/// Keys are parsed [`ConnectionDescriptor`]s, so `"memory://x"`,
/// `" MEMORY://x "` and every other spelling of the same connection resolve
/// to the same client.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<ConnectionDescriptor, Arc<BlobLiteClient>>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the client for a configuration, connecting on first use
    ///
    /// # Errors
    ///
    /// `InvalidArgument` or `InvalidConnectionString` for a bad connection
    /// string; nothing is registered in that case.
    pub fn get_or_connect(&self, config: &BlobLiteConfig) -> BlobLiteResult<Arc<BlobLiteClient>> {
        let descriptor: ConnectionDescriptor = config.connection_string.parse()?;
        if let Some(client) = self.clients.get(&descriptor) {
            return Ok(client.value().clone());
        }

        // The entry lock makes a concurrent caller for the same connection
        // wait and reuse this client
        let entry = self.clients.entry(descriptor.clone()).or_insert_with(|| {
            debug!(connection = %descriptor, "Registered blob client");
            Arc::new(BlobLiteClient::from_descriptor(&descriptor))
        });
        Ok(entry.value().clone())
    }

    /// Register an existing client, replacing any previous one
    pub fn register(&self, descriptor: ConnectionDescriptor, client: Arc<BlobLiteClient>) {
        self.clients.insert(descriptor, client);
    }

    /// Get a registered client
    pub fn get(&self, descriptor: &ConnectionDescriptor) -> Option<Arc<BlobLiteClient>> {
        self.clients
            .get(descriptor)
            .map(|client| client.value().clone())
    }

    /// Number of registered clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client is registered
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
