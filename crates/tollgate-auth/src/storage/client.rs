//! Client lookup for the token endpoint.
//!
//! [`ClientStorage`] is the read interface the validator consumes.
//! [`StaticClientRegistry`] implements it over an immutable snapshot of the
//! configured clients held behind an `ArcSwap`: every lookup is a single atomic
//! load, and [`StaticClientRegistry::reload`] replaces the whole snapshot at once.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tracing::info;

use crate::AuthResult;
use crate::config::{ConfigError, validate_clients};
use crate::secret::verify_client_secret_async;
use crate::types::Client;

// =============================================================================
// Client Storage Trait
// =============================================================================

/// Read access to OAuth 2.0 client registrations.
///
/// Implementations must be safe for concurrent use by many in-flight requests.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Find a client by its OAuth client_id.
    ///
    /// Returns `None` if the client doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Arc<Client>>>;

    /// Verify a client secret.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the secret matches
    /// - `Ok(false)` if the secret doesn't match, the client has no secret,
    ///   or the client doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn verify_secret(&self, client_id: &str, secret: &str) -> AuthResult<bool>;
}

// =============================================================================
// Static Registry
// =============================================================================

type ClientSnapshot = HashMap<String, Arc<Client>>;

/// In-memory client registry built from configuration.
#[derive(Clone)]
pub struct StaticClientRegistry {
    /// Current snapshot (lock-free reads)
    inner: Arc<ArcSwap<ClientSnapshot>>,
}

impl StaticClientRegistry {
    /// Creates a registry from validated client registrations.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any client is invalid or registered twice.
    pub fn new(clients: Vec<Client>) -> Result<Self, ConfigError> {
        let snapshot = build_snapshot(clients)?;
        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(snapshot)),
        })
    }

    /// Replaces every registration at once.
    ///
    /// In-flight requests keep the snapshot they already loaded. If the new set
    /// is invalid the current snapshot stays in place.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any client is invalid or registered twice.
    pub fn reload(&self, clients: Vec<Client>) -> Result<(), ConfigError> {
        let snapshot = build_snapshot(clients)?;
        let count = snapshot.len();
        self.inner.store(Arc::new(snapshot));
        info!(clients = count, "Client registry reloaded");
        Ok(())
    }

    /// Number of registered clients in the current snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// Returns `true` if no clients are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }
}

fn build_snapshot(clients: Vec<Client>) -> Result<ClientSnapshot, ConfigError> {
    validate_clients(&clients)?;
    Ok(clients
        .into_iter()
        .map(|c| (c.client_id.clone(), Arc::new(c)))
        .collect())
}

impl std::fmt::Debug for StaticClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticClientRegistry")
            .field("clients", &self.len())
            .finish()
    }
}

#[async_trait]
impl ClientStorage for StaticClientRegistry {
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<Arc<Client>>> {
        Ok(self.inner.load().get(client_id).cloned())
    }

    async fn verify_secret(&self, client_id: &str, secret: &str) -> AuthResult<bool> {
        let client = match self.inner.load().get(client_id) {
            Some(client) => Arc::clone(client),
            None => return Ok(false),
        };

        match client.client_secret.as_deref() {
            Some(hash) => verify_client_secret_async(secret, hash).await,
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::hash_client_secret;
    use crate::types::GrantType;

    fn service_client(id: &str, secret: &str) -> Client {
        Client {
            client_id: id.to_string(),
            client_secret: Some(hash_client_secret(secret).unwrap()),
            name: String::new(),
            grant_types: vec![GrantType::ClientCredentials],
            scopes: vec!["api.read".to_string()],
            audience: vec![],
            confidential: true,
            active: true,
            access_token_lifetime: None,
        }
    }

    #[tokio::test]
    async fn test_find_and_verify() {
        let registry = StaticClientRegistry::new(vec![service_client("c1", "pw")]).unwrap();

        let client = registry.find_by_client_id("c1").await.unwrap().unwrap();
        assert_eq!(client.client_id, "c1");
        assert!(registry.find_by_client_id("nope").await.unwrap().is_none());

        assert!(registry.verify_secret("c1", "pw").await.unwrap());
        assert!(!registry.verify_secret("c1", "wrong").await.unwrap());
        assert!(!registry.verify_secret("nope", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn test_reload_swaps_snapshot() {
        let registry = StaticClientRegistry::new(vec![service_client("c1", "pw")]).unwrap();
        let held = registry.find_by_client_id("c1").await.unwrap().unwrap();

        registry
            .reload(vec![service_client("c2", "pw")])
            .unwrap();

        assert!(registry.find_by_client_id("c1").await.unwrap().is_none());
        assert!(registry.find_by_client_id("c2").await.unwrap().is_some());
        // Previously loaded registrations stay usable.
        assert_eq!(held.client_id, "c1");
    }

    #[tokio::test]
    async fn test_invalid_reload_keeps_snapshot() {
        let registry = StaticClientRegistry::new(vec![service_client("c1", "pw")]).unwrap();

        let mut broken = service_client("c2", "pw");
        broken.grant_types.clear();
        assert!(registry.reload(vec![broken]).is_err());

        assert_eq!(registry.len(), 1);
        assert!(registry.find_by_client_id("c1").await.unwrap().is_some());
    }

    #[test]
    fn test_lookup_from_blocking_context() {
        let registry = StaticClientRegistry::new(vec![service_client("c1", "pw")]).unwrap();
        let found = tokio_test::block_on(registry.find_by_client_id("c1")).unwrap();
        assert_eq!(found.map(|c| c.client_id.clone()).as_deref(), Some("c1"));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = StaticClientRegistry::new(vec![
            service_client("c1", "a"),
            service_client("c1", "b"),
        ]);
        assert!(result.is_err());
    }
}
