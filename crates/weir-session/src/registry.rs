//! Session registry - client id to session routing
//!
//! Sessions are created lazily on first contact. Creation must be an
//! atomic insert-if-absent because many connection handlers admit
//! messages concurrently; after creation only the delivery worker touches
//! the session, through the handed-out `Arc<Mutex<_>>`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use weir_core::ClientId;

use crate::ClientSession;

/// Shared handle to one client's session
pub type SharedSession = Arc<Mutex<ClientSession>>;

/// Concurrent client id -> session map
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ClientId, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for the client, if one exists.
    pub fn get(&self, client_id: ClientId) -> Option<SharedSession> {
        self.sessions.read().get(&client_id).cloned()
    }

    /// Session for the client, created on first contact.
    pub fn get_or_create(&self, client_id: ClientId) -> SharedSession {
        if let Some(session) = self.sessions.read().get(&client_id) {
            return session.clone();
        }
        self.sessions
            .write()
            .entry(client_id)
            .or_insert_with(|| {
                tracing::debug!(client = %client_id, "creating session on first contact");
                Arc::new(Mutex::new(ClientSession::new(client_id)))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_creation_is_idempotent() {
        let registry = SessionRegistry::new();
        assert!(registry.get(ClientId(1)).is_none());

        let a = registry.get_or_create(ClientId(1));
        let b = registry.get_or_create(ClientId(1));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);

        registry.get_or_create(ClientId(2));
        assert_eq!(registry.len(), 2);
    }
}
