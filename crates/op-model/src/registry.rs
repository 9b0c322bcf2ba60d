//! Read-only client registry.
//!
//! The registry is built once from the full set of registered clients and
//! is immutable afterwards, so lookups need no locking and the registry can
//! be shared freely across concurrent requests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::Client;

/// Immutable lookup of registered clients by `client_id`.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, Arc<Client>>,
}

impl ClientRegistry {
    /// Builds a registry from a set of clients.
    #[must_use]
    pub fn from_clients(clients: impl IntoIterator<Item = Client>) -> Self {
        Self {
            clients: clients
                .into_iter()
                .map(|c| (c.client_id.clone(), Arc::new(c)))
                .collect(),
        }
    }

    /// Looks up an enabled client. Disabled clients read as absent.
    #[must_use]
    pub fn get(&self, client_id: &str) -> Option<Arc<Client>> {
        self.clients
            .get(client_id)
            .filter(|c| c.enabled)
            .cloned()
    }

    /// Returns the number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
