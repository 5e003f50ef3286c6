//! OAuth2 Flows
//!
//! Grant processing of the authorization server.
//!
//! - **Implicit Grant** (RFC 6749 Section 4.2) and the authorization step of
//!   the **Authorization Code Grant** (Section 4.1) at the authorization
//!   endpoint
//! - **Resource Owner Password Credentials Grant** (Section 4.3)
//! - **Client Credentials Grant** (Section 4.4)
//! - **Authorization Code** redemption (Section 4.1.3)
//! - **Refresh Token** rotation (Section 6)

pub mod authorization;
pub mod authorization_code;
pub mod client_credentials;
pub mod issuance;
pub mod password;
pub mod refresh_token;

use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::core::codec::TokenCodec;
use crate::error::{EngineResult, OAuth2Error};
use crate::registry::{ClientRegistry, PlainSecretVerifier, SecretVerifier};
use crate::telemetry::{NoOpMetrics, ServerMetrics};
use crate::token::storage::CredentialStore;
use crate::types::{
    Client, ClientCredentials, GrantType, ResourceOwner, ScopeSet, ServerConfig, TokenRequest,
    TokenResponse,
};

pub use authorization::{AuthorizationFailure, AuthorizationOutcome, AUTHORIZATION_FORM_NOTICE};
pub use issuance::IssuePolicy;

/// Grant engine.
///
/// Validates authorization and token requests, issues credentials and
/// persists them through the [`CredentialStore`]. Every failure is
/// classified as an [`OAuth2Error`] at the point it is detected; internal
/// failures surface as other [`EngineError`](crate::error::EngineError)
/// variants and are folded into `server_error` at the edge.
#[derive(Clone)]
pub struct GrantEngine {
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) codec: TokenCodec,
    pub(crate) store: Arc<dyn CredentialStore>,
    pub(crate) registry: Arc<dyn ClientRegistry>,
    pub(crate) verifier: Arc<dyn SecretVerifier>,
    pub(crate) metrics: Arc<dyn ServerMetrics>,
}

impl GrantEngine {
    /// Create a grant engine with plain secret verification and no metrics.
    pub fn new(
        config: ServerConfig,
        registry: Arc<dyn ClientRegistry>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            codec: config.codec(),
            config: Arc::new(config),
            store,
            registry,
            verifier: Arc::new(PlainSecretVerifier),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Use a custom secret verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn SecretVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Use a metrics sink.
    pub fn with_metrics(mut self, metrics: Arc<dyn ServerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<dyn ServerMetrics> {
        &self.metrics
    }

    /// Process a token endpoint request.
    #[instrument(
        skip(self, request),
        fields(grant_type = %request.grant_type, client_id = %request.client.client_id)
    )]
    pub async fn token(&self, request: TokenRequest) -> EngineResult<TokenResponse> {
        self.metrics.record_token_request(request.grant_type.as_str());

        let result = match self.authenticate_client(&request.client).await {
            Ok(client) => match request.grant_type {
                GrantType::Password => self.handle_password_grant(&client, &request).await,
                GrantType::ClientCredentials => {
                    self.handle_client_credentials_grant(&client, &request).await
                }
                GrantType::AuthorizationCode => {
                    self.handle_authorization_code_grant(&client, &request).await
                }
                GrantType::RefreshToken => self.handle_refresh_token_grant(&client, &request).await,
            },
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => info!("token request granted"),
            Err(e) => {
                debug!(error = e.error_code(), "token request rejected");
                self.metrics.record_error("token", e.error_code());
            }
        }
        result
    }

    /// Load a client and check its secret when it is confidential.
    pub(crate) async fn authenticate_client(
        &self,
        credentials: &ClientCredentials,
    ) -> EngineResult<Client> {
        let client = self
            .registry
            .lookup_client(&credentials.client_id)
            .await?
            .ok_or_else(|| OAuth2Error::invalid_client("unknown client"))?;

        if let Some(stored) = &client.secret {
            let authenticated = credentials
                .client_secret
                .as_ref()
                .is_some_and(|presented| self.verifier.verify(stored, presented));
            if !authenticated {
                return Err(OAuth2Error::invalid_client("unknown client").into());
            }
        }

        Ok(client)
    }

    /// Load a resource owner and check the presented password.
    pub(crate) async fn authenticate_owner(
        &self,
        username: Option<&str>,
        password: Option<&SecretString>,
    ) -> EngineResult<ResourceOwner> {
        let (Some(username), Some(password)) = (username, password) else {
            return Err(OAuth2Error::access_denied("").into());
        };

        match self.registry.lookup_resource_owner(username).await? {
            Some(owner) if self.verifier.verify(&owner.secret, password) => Ok(owner),
            _ => Err(OAuth2Error::access_denied("").into()),
        }
    }

    /// Scope a client may request.
    pub(crate) fn allowed_scope<'a>(&'a self, client: &'a Client) -> &'a ScopeSet {
        client
            .allowed_scope
            .as_ref()
            .unwrap_or(self.config.allowed_scope())
    }

    pub(crate) fn check_allowed_scope(&self, client: &Client, requested: &ScopeSet) -> EngineResult<()> {
        if self.allowed_scope(client).includes(requested) {
            Ok(())
        } else {
            Err(OAuth2Error::invalid_scope("").into())
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::registry::InMemoryRegistry;
    use crate::token::storage::InMemoryCredentialStore;
    use crate::types::ResourceOwner;

    pub const REDIRECT_URI: &str = "http://example.com/callback";

    pub fn engine() -> (GrantEngine, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        (engine_with_store(store.clone()), store)
    }

    pub fn engine_with_store(store: Arc<dyn CredentialStore>) -> GrantEngine {
        let registry = InMemoryRegistry::new();
        registry
            .add_client(Client::confidential("client1", "foo", REDIRECT_URI))
            .unwrap()
            .add_client(Client::public("client2", REDIRECT_URI))
            .unwrap()
            .add_client(
                Client::confidential("client3", "baz", REDIRECT_URI)
                    .with_allowed_scope(ScopeSet::parse("foo")),
            )
            .unwrap()
            .add_resource_owner(ResourceOwner::new("user1", "bar"))
            .unwrap();

        let config = ServerConfig::new(b"a-very-long-secret", ScopeSet::parse("foo bar")).unwrap();
        GrantEngine::new(config, Arc::new(registry), store)
    }

    pub fn client1() -> ClientCredentials {
        ClientCredentials::new("client1", Some("foo"))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::error::{EngineError, ErrorCode, RegistryError};
    use crate::registry::MockClientRegistry;
    use crate::token::storage::InMemoryCredentialStore;

    fn code_of<T: std::fmt::Debug>(result: EngineResult<T>) -> ErrorCode {
        result.unwrap_err().into_oauth2().code
    }

    #[tokio::test]
    async fn test_authenticate_client() {
        let (engine, _) = engine();

        let client = engine.authenticate_client(&client1()).await.unwrap();
        assert_eq!(client.id, "client1");

        let public = ClientCredentials::new("client2", None);
        assert!(engine.authenticate_client(&public).await.is_ok());

        let wrong_secret = ClientCredentials::new("client1", Some("bar"));
        assert_eq!(
            code_of(engine.authenticate_client(&wrong_secret).await),
            ErrorCode::InvalidClient
        );

        let missing_secret = ClientCredentials::new("client1", None);
        assert_eq!(
            code_of(engine.authenticate_client(&missing_secret).await),
            ErrorCode::InvalidClient
        );

        let unknown = ClientCredentials::new("client9", Some("foo"));
        assert_eq!(
            code_of(engine.authenticate_client(&unknown).await),
            ErrorCode::InvalidClient
        );
    }

    #[tokio::test]
    async fn test_authenticate_owner() {
        let (engine, _) = engine();
        let password = SecretString::new("bar".to_string());
        let wrong = SecretString::new("baz".to_string());

        assert!(engine
            .authenticate_owner(Some("user1"), Some(&password))
            .await
            .is_ok());
        assert_eq!(
            code_of(engine.authenticate_owner(Some("user1"), Some(&wrong)).await),
            ErrorCode::AccessDenied
        );
        assert_eq!(
            code_of(engine.authenticate_owner(Some("user9"), Some(&password)).await),
            ErrorCode::AccessDenied
        );
        assert_eq!(
            code_of(engine.authenticate_owner(None, Some(&password)).await),
            ErrorCode::AccessDenied
        );
    }

    #[tokio::test]
    async fn test_allowed_scope_prefers_client_restriction() {
        let (engine, _) = engine();
        let client3 = engine
            .authenticate_client(&ClientCredentials::new("client3", Some("baz")))
            .await
            .unwrap();

        assert!(engine.check_allowed_scope(&client3, &ScopeSet::parse("foo")).is_ok());
        assert!(engine.check_allowed_scope(&client3, &ScopeSet::parse("bar")).is_err());
    }

    #[tokio::test]
    async fn test_registry_failure_is_internal() {
        let mut registry = MockClientRegistry::new();
        registry.expect_lookup_client().returning(|_| {
            Err(RegistryError::Unavailable {
                message: "connection refused".to_string(),
            })
        });

        let config = ServerConfig::new(b"secret", ScopeSet::parse("foo")).unwrap();
        let engine = GrantEngine::new(
            config,
            Arc::new(registry),
            Arc::new(InMemoryCredentialStore::new()),
        );

        let request = TokenRequest::new(GrantType::ClientCredentials, client1());
        let error = engine.token(request).await.unwrap_err();
        assert!(matches!(error, EngineError::Registry(_)));

        let folded = error.into_oauth2();
        assert_eq!(folded.code, ErrorCode::ServerError);
        assert!(folded.description.is_none());
    }
}
