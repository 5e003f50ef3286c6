//! Authorization Server
//!
//! HTTP-level facade that parses endpoint requests, runs them through the
//! [`GrantEngine`] and renders the result as an [`HttpResponse`].

use std::sync::Arc;
use tracing::{debug, warn};

use crate::bearer::BearerValidator;
use crate::core::response::{
    write_bearer_error, write_code_response, write_error, write_json, write_redirect_error,
    write_text, write_token_response,
};
use crate::core::transport::{HttpRequest, HttpResponse};
use crate::error::{EngineError, OAuth2Error};
use crate::flows::{AuthorizationFailure, AuthorizationOutcome, GrantEngine, AUTHORIZATION_FORM_NOTICE};
use crate::registry::ClientRegistry;
use crate::token::{CredentialStore, TokenIntrospector, TokenRevoker};
use crate::types::{
    AuthorizationRequest, Credential, IntrospectionRequest, RevocationRequest, ScopeSet,
    ServerConfig, TokenRequest,
};

/// Authorization server exposing the authorization, token, revocation and
/// introspection endpoints plus bearer protection of resources.
#[derive(Clone)]
pub struct AuthorizationServer {
    engine: GrantEngine,
    validator: BearerValidator,
}

impl AuthorizationServer {
    /// Create a server around a grant engine. The bearer validator shares
    /// the engine's codec, store and metrics.
    pub fn new(engine: GrantEngine) -> Self {
        let validator = BearerValidator::new(engine.codec().clone(), engine.store().clone())
            .with_metrics(engine.metrics().clone());
        Self { engine, validator }
    }

    /// Get the grant engine.
    pub fn engine(&self) -> &GrantEngine {
        &self.engine
    }

    /// Get the bearer validator.
    pub fn validator(&self) -> &BearerValidator {
        &self.validator
    }

    fn realm(&self) -> &str {
        self.engine.config().realm()
    }

    // ========== Authorization Endpoint ==========

    /// Handle an authorization endpoint request (`response_type` of `token`
    /// or `code`).
    pub async fn authorize(&self, request: &HttpRequest) -> HttpResponse {
        let request = match AuthorizationRequest::parse(request) {
            Ok(request) => request,
            Err(e) => return self.reject("authorize", &e),
        };

        match self.engine.authorize(request).await {
            Ok(AuthorizationOutcome::Form) => write_text(200, AUTHORIZATION_FORM_NOTICE),
            Ok(AuthorizationOutcome::Token(response)) => {
                write_token_response(&response, self.realm())
            }
            Ok(AuthorizationOutcome::Code {
                redirect_uri,
                response,
            }) => write_code_response(&redirect_uri, &response, self.realm()),
            Err(AuthorizationFailure::Direct(error)) => write_error(&error, self.realm()),
            Err(AuthorizationFailure::Redirect {
                uri,
                use_fragment,
                error,
            }) => write_redirect_error(&uri, use_fragment, &error, self.realm()),
        }
    }

    // ========== Token Endpoint ==========

    /// Handle a token endpoint request.
    pub async fn token(&self, request: &HttpRequest) -> HttpResponse {
        let request = match TokenRequest::parse(request) {
            Ok(request) => request,
            Err(e) => return self.reject("token", &e),
        };

        match self.engine.token(request).await {
            Ok(response) => write_token_response(&response, self.realm()),
            Err(e) => self.fail(e),
        }
    }

    // ========== Revocation Endpoint ==========

    /// Handle a token revocation request.
    pub async fn revoke(&self, request: &HttpRequest) -> HttpResponse {
        let request = match RevocationRequest::parse(request) {
            Ok(request) => request,
            Err(e) => return self.reject("revoke", &e),
        };

        match self.engine.revoke(request).await {
            Ok(()) => HttpResponse::new(200),
            Err(e) => self.fail(e),
        }
    }

    // ========== Introspection Endpoint ==========

    /// Handle a token introspection request.
    pub async fn introspect(&self, request: &HttpRequest) -> HttpResponse {
        let request = match IntrospectionRequest::parse(request) {
            Ok(request) => request,
            Err(e) => return self.reject("introspect", &e),
        };

        match self.engine.introspect(request).await {
            Ok(response) => write_json(200, &response),
            Err(e) => self.fail(e),
        }
    }

    // ========== Protected Resources ==========

    /// Authorize a protected resource request requiring `required` scope.
    ///
    /// Returns the access token's credential, or the challenge response to
    /// send back.
    pub async fn authorize_resource(
        &self,
        request: &HttpRequest,
        required: &ScopeSet,
    ) -> Result<Credential, HttpResponse> {
        self.validator
            .authorize(request, required)
            .await
            .map_err(|e| write_bearer_error(&e, self.realm()))
    }

    fn reject(&self, endpoint: &str, error: &OAuth2Error) -> HttpResponse {
        debug!(endpoint, error = error.code.as_str(), "malformed request");
        self.engine.metrics().record_error(endpoint, error.code.as_str());
        write_error(error, self.realm())
    }

    fn fail(&self, error: EngineError) -> HttpResponse {
        if error.is_internal() {
            warn!(error = %error, "request failed");
        }
        write_error(&error.into_oauth2(), self.realm())
    }
}

/// Create an authorization server with plain secret verification.
pub fn authorization_server(
    config: ServerConfig,
    registry: Arc<dyn ClientRegistry>,
    store: Arc<dyn CredentialStore>,
) -> AuthorizationServer {
    AuthorizationServer::new(GrantEngine::new(config, registry, store))
}
