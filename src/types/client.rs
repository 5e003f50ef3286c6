//! Client Types
//!
//! Registered clients and resource owners, as returned by a registry.

use secrecy::SecretString;
use std::fmt;

use crate::types::ScopeSet;

/// Registered client application.
#[derive(Clone)]
pub struct Client {
    /// Client identifier.
    pub id: String,
    /// Client secret, present for confidential clients.
    pub secret: Option<SecretString>,
    /// Registered redirect URI, matched exactly.
    pub redirect_uri: String,
    /// Per-client scope restriction; the server default applies when unset.
    pub allowed_scope: Option<ScopeSet>,
}

impl Client {
    /// Create a public client.
    pub fn public(id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: None,
            redirect_uri: redirect_uri.into(),
            allowed_scope: None,
        }
    }

    /// Create a confidential client.
    pub fn confidential(
        id: impl Into<String>,
        secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            secret: Some(SecretString::new(secret.into())),
            ..Self::public(id, redirect_uri)
        }
    }

    pub fn with_allowed_scope(mut self, scope: ScopeSet) -> Self {
        self.allowed_scope = Some(scope);
        self
    }

    pub fn is_confidential(&self) -> bool {
        self.secret.is_some()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("redirect_uri", &self.redirect_uri)
            .field("allowed_scope", &self.allowed_scope)
            .finish()
    }
}

/// Resource owner known to the registry.
#[derive(Clone)]
pub struct ResourceOwner {
    pub username: String,
    pub secret: SecretString,
}

impl ResourceOwner {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: SecretString::new(secret.into()),
        }
    }
}

impl fmt::Debug for ResourceOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceOwner")
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidentiality() {
        assert!(!Client::public("app", "http://example.com/callback").is_confidential());
        assert!(Client::confidential("app", "secret", "http://example.com/callback").is_confidential());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let client = Client::confidential("app", "client-secret", "http://example.com");
        assert!(!format!("{:?}", client).contains("client-secret"));

        let owner = ResourceOwner::new("user", "owner-secret");
        assert!(!format!("{:?}", owner).contains("owner-secret"));
    }
}
