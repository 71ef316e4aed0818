//! Service registry: the mapping from client id to registered public key.
//!
//! [`ServiceRegistry`] is the read-only lookup the verifier depends on.
//! [`RegistrySnapshot`] is an immutable table built in one go, and
//! [`SharedServiceRegistry`] publishes snapshots with copy-on-write
//! semantics: a reload builds a complete replacement and swaps a single
//! `Arc` under a lock held only for the swap. Lookups clone the current `Arc`
//! and search it without holding any lock, so a reload never blocks a lookup
//! and no lookup ever observes a partially built table.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::KeyError;
use crate::keys::{PublicKeyMaterial, parse_public_key};

/// A trusted caller and its registered key.
///
/// The key is kept in the encoding the operator registered it in and parsed
/// on use, so that a broken entry surfaces as a server-side configuration
/// fault for that client rather than failing the whole registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    /// Identifier sent by the caller in `X-Client-Id`.
    pub client_id: String,
    /// Human readable name, for logs.
    pub name: Option<String>,
    /// Registered public key, in any encoding accepted by [`parse_public_key`].
    pub public_key: String,
}

impl ServiceIdentity {
    /// Create an identity without a display name.
    pub fn new(client_id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            name: None,
            public_key: public_key.into(),
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse the registered key.
    pub fn parse_public_key(&self) -> Result<PublicKeyMaterial, KeyError> {
        parse_public_key(self.public_key.as_bytes())
    }
}

/// Read-only lookup of service identities by client id.
///
/// Implementations may back this with configuration files, a database,
/// or any other store.
pub trait ServiceRegistry: Send + Sync {
    /// Find the identity registered under `client_id`.
    fn lookup(&self, client_id: &str) -> Option<Arc<ServiceIdentity>>;
}

/// An immutable client id to identity table.
///
/// # Examples
///
/// ```
/// use mds_auth::registry::{RegistrySnapshot, ServiceIdentity, ServiceRegistry};
///
/// let snapshot = RegistrySnapshot::new(vec![ServiceIdentity::new("svc-1", "key")]);
/// assert!(snapshot.lookup("svc-1").is_some());
/// assert!(snapshot.lookup("svc-2").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    services: HashMap<String, Arc<ServiceIdentity>>,
}

impl RegistrySnapshot {
    /// Build a snapshot. When two identities share a client id the later one wins.
    pub fn new(services: impl IntoIterator<Item = ServiceIdentity>) -> Self {
        Self {
            services: services
                .into_iter()
                .map(|identity| (identity.client_id.clone(), Arc::new(identity)))
                .collect(),
        }
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no service is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Registered client ids, sorted.
    #[must_use]
    pub fn client_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.services.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl ServiceRegistry for RegistrySnapshot {
    fn lookup(&self, client_id: &str) -> Option<Arc<ServiceIdentity>> {
        self.services.get(client_id).cloned()
    }
}

/// A reloadable registry that publishes immutable snapshots.
#[derive(Debug, Default)]
pub struct SharedServiceRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl SharedServiceRegistry {
    /// Create a registry serving `snapshot`.
    #[must_use]
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot currently being served.
    ///
    /// The returned `Arc` stays valid after a later [`replace`](Self::replace).
    #[must_use]
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Publish a new snapshot, returning the one it replaced.
    pub fn replace(&self, snapshot: RegistrySnapshot) -> Arc<RegistrySnapshot> {
        let next = Arc::new(snapshot);
        std::mem::replace(&mut *self.current.write(), next)
    }
}

impl ServiceRegistry for SharedServiceRegistry {
    fn lookup(&self, client_id: &str) -> Option<Arc<ServiceIdentity>> {
        self.snapshot().lookup(client_id)
    }
}
