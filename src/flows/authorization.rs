//! Authorization Endpoint
//!
//! RFC 6749 Sections 4.1.1 and 4.2.1. Handles the implicit grant and the
//! authorization step of the authorization code grant.
//!
//! Errors detected before the redirect URI is validated are delivered
//! directly; later errors are delivered to the client through the redirect
//! URI (fragment for `token`, query for `code`).

use tracing::{debug, instrument, warn};

use crate::core::transport::HttpMethod;
use crate::error::{EngineResult, ErrorCode, OAuth2Error};
use crate::flows::issuance::{Grant, IssuePolicy};
use crate::flows::GrantEngine;
use crate::types::{AuthorizationRequest, Client, CodeResponse, ResponseType, TokenResponse};

/// Text returned for GET requests to the authorization endpoint.
pub const AUTHORIZATION_FORM_NOTICE: &str =
    "This authentication server does not provide an authorization form.";

/// Successful authorization endpoint result.
#[derive(Debug)]
pub enum AuthorizationOutcome {
    /// GET request with valid client and redirect URI. Nothing was granted.
    Form,
    /// Implicit grant token, delivered in the redirect fragment.
    Token(TokenResponse),
    /// Authorization code, delivered in the redirect query.
    Code {
        redirect_uri: String,
        response: CodeResponse,
    },
}

/// Failed authorization endpoint request.
#[derive(Debug)]
pub enum AuthorizationFailure {
    /// Deliver the error directly to the user agent.
    Direct(OAuth2Error),
    /// Deliver the error to the client through its redirect URI.
    Redirect {
        uri: String,
        use_fragment: bool,
        error: OAuth2Error,
    },
}

impl AuthorizationFailure {
    pub fn error(&self) -> &OAuth2Error {
        match self {
            Self::Direct(error) => error,
            Self::Redirect { error, .. } => error,
        }
    }
}

impl GrantEngine {
    /// Process an authorization endpoint request.
    #[instrument(
        skip(self, request),
        fields(response_type = %request.response_type, client_id = %request.client_id)
    )]
    pub async fn authorize(
        &self,
        request: AuthorizationRequest,
    ) -> Result<AuthorizationOutcome, AuthorizationFailure> {
        self.metrics
            .record_authorization_request(request.response_type.as_str());

        let result = self.process_authorization(&request).await;
        if let Err(failure) = &result {
            let code = failure.error().code.as_str();
            debug!(error = code, "authorization request rejected");
            self.metrics.record_error("authorize", code);
        }
        result
    }

    async fn process_authorization(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationOutcome, AuthorizationFailure> {
        let state = request.state.as_deref();

        let client = match self.registry.lookup_client(&request.client_id).await {
            Ok(Some(client)) => client,
            Ok(None) => {
                return Err(AuthorizationFailure::Direct(
                    OAuth2Error::invalid_client("unknown client").with_state(state),
                ))
            }
            Err(e) => {
                warn!(error = %e, "client lookup failed");
                return Err(AuthorizationFailure::Direct(
                    OAuth2Error::from_code(ErrorCode::ServerError).with_state(state),
                ));
            }
        };

        if client.redirect_uri != request.redirect_uri {
            return Err(AuthorizationFailure::Direct(
                OAuth2Error::invalid_request("invalid redirect URI").with_state(state),
            ));
        }

        if request.method == HttpMethod::Get {
            return Ok(AuthorizationOutcome::Form);
        }

        let outcome = match request.response_type {
            ResponseType::Token => self
                .handle_implicit_grant(&client, request)
                .await
                .map(AuthorizationOutcome::Token),
            ResponseType::Code => self
                .handle_code_authorization(&client, request)
                .await
                .map(|response| AuthorizationOutcome::Code {
                    redirect_uri: request.redirect_uri.clone(),
                    response,
                }),
        };

        outcome.map_err(|e| {
            if e.is_internal() {
                warn!(error = %e, "authorization failed");
            }
            AuthorizationFailure::Redirect {
                uri: request.redirect_uri.clone(),
                use_fragment: request.response_type.uses_fragment(),
                error: e.into_oauth2().with_state(state),
            }
        })
    }

    async fn handle_implicit_grant(
        &self,
        client: &Client,
        request: &AuthorizationRequest,
    ) -> EngineResult<TokenResponse> {
        self.check_allowed_scope(client, &request.scope)?;
        let owner = self
            .authenticate_owner(request.username.as_deref(), request.password.as_ref())
            .await?;

        let response = self
            .issue_tokens(Grant {
                client_id: &client.id,
                resource_owner_id: Some(&owner.username),
                scope: &request.scope,
                parent_code: None,
                policy: IssuePolicy::AccessTokenOnly,
            })
            .await?;

        Ok(response
            .with_state(request.state.as_deref())
            .with_redirect(&request.redirect_uri, true))
    }

    async fn handle_code_authorization(
        &self,
        client: &Client,
        request: &AuthorizationRequest,
    ) -> EngineResult<CodeResponse> {
        self.check_allowed_scope(client, &request.scope)?;
        let owner = self
            .authenticate_owner(request.username.as_deref(), request.password.as_ref())
            .await?;

        let code = self
            .issue_authorization_code(&client.id, &owner.username, &request.scope, &request.redirect_uri)
            .await?;

        Ok(CodeResponse::new(code).with_state(request.state.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::test_support::*;
    use crate::token::storage::CredentialStore;
    use crate::types::{CredentialKind, ScopeSet};
    use secrecy::SecretString;

    fn request(response_type: ResponseType, scope: &str, password: &str) -> AuthorizationRequest {
        AuthorizationRequest {
            method: HttpMethod::Post,
            response_type,
            client_id: "client2".to_string(),
            redirect_uri: REDIRECT_URI.to_string(),
            scope: ScopeSet::parse(scope),
            state: Some("xyz".to_string()),
            username: Some("user1".to_string()),
            password: Some(SecretString::new(password.to_string())),
        }
    }

    #[tokio::test]
    async fn test_implicit_grant() {
        let (engine, store) = engine();

        let outcome = engine
            .authorize(request(ResponseType::Token, "foo", "bar"))
            .await
            .unwrap();

        let AuthorizationOutcome::Token(response) = outcome else {
            panic!("expected token outcome");
        };
        assert!(response.refresh_token.is_none());
        assert_eq!(response.state.as_deref(), Some("xyz"));
        let target = response.redirect.unwrap();
        assert_eq!(target.uri, REDIRECT_URI);
        assert!(target.use_fragment);

        assert_eq!(store.count(CredentialKind::AccessToken).unwrap(), 1);
        assert_eq!(store.count(CredentialKind::RefreshToken).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_code_authorization() {
        let (engine, store) = engine();

        let outcome = engine
            .authorize(request(ResponseType::Code, "foo", "bar"))
            .await
            .unwrap();

        let AuthorizationOutcome::Code { redirect_uri, response } = outcome else {
            panic!("expected code outcome");
        };
        assert_eq!(redirect_uri, REDIRECT_URI);
        assert_eq!(response.state.as_deref(), Some("xyz"));

        let signature = engine.codec().parse(&response.code).unwrap().signature();
        let stored = store
            .get(CredentialKind::AuthorizationCode, &signature)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.client_id, "client2");
        assert_eq!(stored.resource_owner_id.as_deref(), Some("user1"));
    }

    #[tokio::test]
    async fn test_get_returns_form_notice() {
        let (engine, store) = engine();
        let mut get = request(ResponseType::Token, "foo", "bar");
        get.method = HttpMethod::Get;

        let outcome = engine.authorize(get).await.unwrap();
        assert!(matches!(outcome, AuthorizationOutcome::Form));
        assert_eq!(store.count(CredentialKind::AccessToken).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_errors_before_redirect_validation_are_direct() {
        let (engine, _) = engine();

        let mut unknown = request(ResponseType::Token, "foo", "bar");
        unknown.client_id = "client9".to_string();
        let failure = engine.authorize(unknown).await.unwrap_err();
        assert!(matches!(failure, AuthorizationFailure::Direct(_)));
        assert_eq!(failure.error().code, ErrorCode::InvalidClient);

        let mut mismatch = request(ResponseType::Token, "foo", "bar");
        mismatch.redirect_uri = "http://evil.example.com".to_string();
        let failure = engine.authorize(mismatch).await.unwrap_err();
        assert!(matches!(failure, AuthorizationFailure::Direct(_)));
        assert_eq!(failure.error().code, ErrorCode::InvalidRequest);
        assert_eq!(failure.error().state.as_deref(), Some("xyz"));
    }

    #[tokio::test]
    async fn test_errors_after_redirect_validation_are_redirected() {
        let (engine, store) = engine();

        let failure = engine
            .authorize(request(ResponseType::Token, "baz", "bar"))
            .await
            .unwrap_err();
        let AuthorizationFailure::Redirect { uri, use_fragment, error } = failure else {
            panic!("expected redirect failure");
        };
        assert_eq!(uri, REDIRECT_URI);
        assert!(use_fragment);
        assert_eq!(error.code, ErrorCode::InvalidScope);
        assert_eq!(error.state.as_deref(), Some("xyz"));

        let failure = engine
            .authorize(request(ResponseType::Code, "foo", "wrong"))
            .await
            .unwrap_err();
        let AuthorizationFailure::Redirect { use_fragment, error, .. } = failure else {
            panic!("expected redirect failure");
        };
        assert!(!use_fragment);
        assert_eq!(error.code, ErrorCode::AccessDenied);

        assert_eq!(store.count(CredentialKind::AccessToken).unwrap(), 0);
        assert_eq!(store.count(CredentialKind::AuthorizationCode).unwrap(), 0);
    }
}
