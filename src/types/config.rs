//! Configuration Types
//!
//! Authorization server configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::codec::{ServerSecret, TokenCodec};
use crate::error::ConfigurationError;
use crate::types::{CredentialKind, ScopeSet};

/// Default random key length of generated tokens, in bytes.
pub const DEFAULT_KEY_LENGTH: usize = 16;
/// Shortest accepted random key length, in bytes.
pub const MIN_KEY_LENGTH: usize = 16;
/// Default access token lifespan (1 hour).
pub const DEFAULT_ACCESS_TOKEN_LIFESPAN: Duration = Duration::from_secs(60 * 60);
/// Default refresh token lifespan (7 days).
pub const DEFAULT_REFRESH_TOKEN_LIFESPAN: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Default authorization code lifespan (10 minutes).
pub const DEFAULT_AUTHORIZATION_CODE_LIFESPAN: Duration = Duration::from_secs(10 * 60);
/// Longest accepted lifespan of any credential (10 years).
pub const MAX_LIFESPAN: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);
/// Realm reported in authentication challenges.
pub const DEFAULT_REALM: &str = "OAuth2";

/// Authorization server configuration.
///
/// Built through [`ServerConfig::new`] or the configuration builder, both of
/// which validate every setting.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub(crate) secret: ServerSecret,
    pub(crate) key_length: usize,
    pub(crate) allowed_scope: ScopeSet,
    pub(crate) access_token_lifespan: Duration,
    pub(crate) refresh_token_lifespan: Duration,
    pub(crate) authorization_code_lifespan: Duration,
    pub(crate) realm: String,
}

impl ServerConfig {
    /// Create a configuration with default lifespans and key length.
    pub fn new(secret: &[u8], allowed_scope: ScopeSet) -> Result<Self, ConfigurationError> {
        let config = Self {
            secret: ServerSecret::new(secret)?,
            key_length: DEFAULT_KEY_LENGTH,
            allowed_scope,
            access_token_lifespan: DEFAULT_ACCESS_TOKEN_LIFESPAN,
            refresh_token_lifespan: DEFAULT_REFRESH_TOKEN_LIFESPAN,
            authorization_code_lifespan: DEFAULT_AUTHORIZATION_CODE_LIFESPAN,
            realm: DEFAULT_REALM.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check key length, lifespans and realm.
    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        if self.key_length < MIN_KEY_LENGTH {
            return Err(ConfigurationError::KeyTooShort {
                length: self.key_length,
                minimum: MIN_KEY_LENGTH,
            });
        }

        for (field, lifespan) in [
            ("access_token_lifespan", self.access_token_lifespan),
            ("refresh_token_lifespan", self.refresh_token_lifespan),
            ("authorization_code_lifespan", self.authorization_code_lifespan),
        ] {
            validate_lifespan(field, lifespan)?;
        }

        if self.realm.is_empty() || self.realm.contains('"') {
            return Err(ConfigurationError::InvalidConfig {
                message: "realm must be non-empty and must not contain quotes".to_string(),
            });
        }
        Ok(())
    }

    /// Token codec for this configuration.
    pub fn codec(&self) -> TokenCodec {
        TokenCodec::new(self.secret.clone(), self.key_length)
    }

    /// Random key length of generated tokens, in bytes.
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Scope a client may request unless it has its own restriction.
    pub fn allowed_scope(&self) -> &ScopeSet {
        &self.allowed_scope
    }

    /// Realm of `WWW-Authenticate` challenges.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Lifespan of a credential kind, capped at [`MAX_LIFESPAN`].
    pub fn lifespan(&self, kind: CredentialKind) -> Duration {
        let lifespan = match kind {
            CredentialKind::AccessToken => self.access_token_lifespan,
            CredentialKind::RefreshToken => self.refresh_token_lifespan,
            CredentialKind::AuthorizationCode => self.authorization_code_lifespan,
        };
        lifespan.min(MAX_LIFESPAN)
    }

    /// Expiry of a credential of `kind` issued at `issued_at`.
    pub fn expires_at(&self, kind: CredentialKind, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at + chrono::Duration::milliseconds(self.lifespan(kind).as_millis() as i64)
    }
}

fn validate_lifespan(field: &str, lifespan: Duration) -> Result<(), ConfigurationError> {
    if lifespan.as_secs() == 0 {
        return Err(ConfigurationError::InvalidLifespan {
            field: field.to_string(),
            message: "must be at least one second".to_string(),
        });
    }
    if lifespan > MAX_LIFESPAN {
        return Err(ConfigurationError::InvalidLifespan {
            field: field.to_string(),
            message: format!("must not exceed {} seconds", MAX_LIFESPAN.as_secs()),
        });
    }
    Ok(())
}

/// Lifespans in seconds, as loaded from a configuration file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifespanSettings {
    pub access_token_secs: u64,
    pub refresh_token_secs: u64,
    pub authorization_code_secs: u64,
}

impl Default for LifespanSettings {
    fn default() -> Self {
        Self {
            access_token_secs: DEFAULT_ACCESS_TOKEN_LIFESPAN.as_secs(),
            refresh_token_secs: DEFAULT_REFRESH_TOKEN_LIFESPAN.as_secs(),
            authorization_code_secs: DEFAULT_AUTHORIZATION_CODE_LIFESPAN.as_secs(),
        }
    }
}
