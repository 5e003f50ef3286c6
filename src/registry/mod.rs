//! Client Registry
//!
//! Lookup of registered clients and resource owners, and verification of
//! the secrets they present. Hosts provide their own registry; the
//! in-memory one suits tests and small deployments.

use async_trait::async_trait;
use ring::hmac;
use ring::rand::SystemRandom;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::RegistryError;
use crate::types::{Client, ResourceOwner};

/// Lookup of clients and resource owners.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Look up a client by identifier.
    async fn lookup_client(&self, client_id: &str) -> Result<Option<Client>, RegistryError>;

    /// Look up a resource owner by username.
    async fn lookup_resource_owner(
        &self,
        username: &str,
    ) -> Result<Option<ResourceOwner>, RegistryError>;
}

/// Comparison of a stored secret with a presented one.
pub trait SecretVerifier: Send + Sync {
    fn verify(&self, stored: &SecretString, presented: &SecretString) -> bool;
}

/// Verifier for secrets stored in plain text.
///
/// The stored secret is signed under a fresh HMAC-SHA256 key and the
/// presented one is checked against that tag, which `ring` compares in
/// constant time.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainSecretVerifier;

impl SecretVerifier for PlainSecretVerifier {
    fn verify(&self, stored: &SecretString, presented: &SecretString) -> bool {
        let Ok(key) = hmac::Key::generate(hmac::HMAC_SHA256, &SystemRandom::new()) else {
            return false;
        };
        let tag = hmac::sign(&key, stored.expose_secret().as_bytes());
        hmac::verify(&key, presented.expose_secret().as_bytes(), tag.as_ref()).is_ok()
    }
}

/// In-memory registry.
#[derive(Default)]
pub struct InMemoryRegistry {
    clients: Mutex<HashMap<String, Client>>,
    owners: Mutex<HashMap<String, ResourceOwner>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client, replacing one with the same identifier.
    pub fn add_client(&self, client: Client) -> Result<&Self, RegistryError> {
        lock(&self.clients)?.insert(client.id.clone(), client);
        Ok(self)
    }

    /// Register a resource owner, replacing one with the same username.
    pub fn add_resource_owner(&self, owner: ResourceOwner) -> Result<&Self, RegistryError> {
        lock(&self.owners)?.insert(owner.username.clone(), owner);
        Ok(self)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RegistryError> {
    mutex.lock().map_err(|_| RegistryError::Unavailable {
        message: "registry lock poisoned".to_string(),
    })
}

#[async_trait]
impl ClientRegistry for InMemoryRegistry {
    async fn lookup_client(&self, client_id: &str) -> Result<Option<Client>, RegistryError> {
        Ok(lock(&self.clients)?.get(client_id).cloned())
    }

    async fn lookup_resource_owner(
        &self,
        username: &str,
    ) -> Result<Option<ResourceOwner>, RegistryError> {
        Ok(lock(&self.owners)?.get(username).cloned())
    }
}
