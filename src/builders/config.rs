//! Configuration Builder
//!
//! Fluent builder for authorization server configuration.

use secrecy::{ExposeSecret, SecretVec};
use std::time::Duration;

use crate::error::ConfigurationError;
use crate::types::{
    LifespanSettings, ScopeSet, ServerConfig, DEFAULT_ACCESS_TOKEN_LIFESPAN,
    DEFAULT_AUTHORIZATION_CODE_LIFESPAN, DEFAULT_KEY_LENGTH, DEFAULT_REALM,
    DEFAULT_REFRESH_TOKEN_LIFESPAN,
};

/// Authorization server configuration builder.
pub struct ServerConfigBuilder {
    secret: Option<SecretVec<u8>>,
    key_length: usize,
    allowed_scope: ScopeSet,
    access_token_lifespan: Duration,
    refresh_token_lifespan: Duration,
    authorization_code_lifespan: Duration,
    realm: String,
}

impl ServerConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self {
            secret: None,
            key_length: DEFAULT_KEY_LENGTH,
            allowed_scope: ScopeSet::new(),
            access_token_lifespan: DEFAULT_ACCESS_TOKEN_LIFESPAN,
            refresh_token_lifespan: DEFAULT_REFRESH_TOKEN_LIFESPAN,
            authorization_code_lifespan: DEFAULT_AUTHORIZATION_CODE_LIFESPAN,
            realm: DEFAULT_REALM.to_string(),
        }
    }

    /// Set token signing secret.
    pub fn secret(mut self, secret: impl AsRef<[u8]>) -> Self {
        self.secret = Some(SecretVec::new(secret.as_ref().to_vec()));
        self
    }

    /// Set random key length of generated tokens.
    pub fn key_length(mut self, key_length: usize) -> Self {
        self.key_length = key_length;
        self
    }

    /// Set scope clients may request.
    pub fn allowed_scope(mut self, scope: impl Into<ScopeSet>) -> Self {
        self.allowed_scope = scope.into();
        self
    }

    /// Set access token lifespan.
    pub fn access_token_lifespan(mut self, lifespan: Duration) -> Self {
        self.access_token_lifespan = lifespan;
        self
    }

    /// Set refresh token lifespan.
    pub fn refresh_token_lifespan(mut self, lifespan: Duration) -> Self {
        self.refresh_token_lifespan = lifespan;
        self
    }

    /// Set authorization code lifespan.
    pub fn authorization_code_lifespan(mut self, lifespan: Duration) -> Self {
        self.authorization_code_lifespan = lifespan;
        self
    }

    /// Set all lifespans from loaded settings.
    pub fn lifespans(self, settings: LifespanSettings) -> Self {
        self.access_token_lifespan(Duration::from_secs(settings.access_token_secs))
            .refresh_token_lifespan(Duration::from_secs(settings.refresh_token_secs))
            .authorization_code_lifespan(Duration::from_secs(settings.authorization_code_secs))
    }

    /// Set challenge realm.
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Build the server configuration.
    pub fn build(self) -> Result<ServerConfig, ConfigurationError> {
        let secret = self
            .secret
            .ok_or_else(|| ConfigurationError::MissingRequired {
                field: "secret".to_string(),
            })?;
        let mut config = ServerConfig::new(secret.expose_secret(), self.allowed_scope)?;
        config.key_length = self.key_length;
        config.access_token_lifespan = self.access_token_lifespan;
        config.refresh_token_lifespan = self.refresh_token_lifespan;
        config.authorization_code_lifespan = self.authorization_code_lifespan;
        config.realm = self.realm;

        config.validate()?;
        Ok(config)
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a new server configuration builder.
pub fn server_config() -> ServerConfigBuilder {
    ServerConfigBuilder::new()
}
