//! Client Credentials Flow
//!
//! RFC 6749 Section 4.4 - Client Credentials Grant.

use crate::error::{EngineResult, OAuth2Error};
use crate::flows::issuance::{Grant, IssuePolicy};
use crate::flows::GrantEngine;
use crate::types::{Client, TokenRequest, TokenResponse};

impl GrantEngine {
    pub(crate) async fn handle_client_credentials_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> EngineResult<TokenResponse> {
        // Only confidential clients can authenticate themselves.
        if !client.is_confidential() {
            return Err(OAuth2Error::invalid_client("unknown client").into());
        }
        self.check_allowed_scope(client, &request.scope)?;

        self.issue_tokens(Grant {
            client_id: &client.id,
            resource_owner_id: None,
            scope: &request.scope,
            parent_code: None,
            policy: IssuePolicy::WithRefreshToken,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorCode;
    use crate::flows::test_support::*;
    use crate::token::storage::CredentialStore;
    use crate::types::{ClientCredentials, CredentialKind, GrantType, ScopeSet, TokenRequest};

    fn request(client: ClientCredentials, scope: &str) -> TokenRequest {
        let mut request = TokenRequest::new(GrantType::ClientCredentials, client);
        request.scope = ScopeSet::parse(scope);
        request
    }

    #[tokio::test]
    async fn test_client_credentials_grant() {
        let (engine, store) = engine();

        let response = engine.token(request(client1(), "foo")).await.unwrap();
        assert_eq!(response.token_type, "bearer");
        assert_eq!(response.expires_in, 3600);
        assert_eq!(response.scope, ScopeSet::parse("foo"));
        assert!(response.refresh_token.is_some());

        let signature = engine.codec().parse(&response.access_token).unwrap().signature();
        let stored = store
            .get(CredentialKind::AccessToken, &signature)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.resource_owner_id.is_none());
    }

    #[tokio::test]
    async fn test_public_client_is_rejected() {
        let (engine, _) = engine();

        let error = engine
            .token(request(ClientCredentials::new("client2", None), "foo"))
            .await
            .unwrap_err();
        assert_eq!(error.into_oauth2().code, ErrorCode::InvalidClient);
    }

    #[tokio::test]
    async fn test_scope_not_allowed() {
        let (engine, store) = engine();

        let error = engine.token(request(client1(), "baz")).await.unwrap_err();
        assert_eq!(error.into_oauth2().code, ErrorCode::InvalidScope);
        assert_eq!(store.count(CredentialKind::AccessToken).unwrap(), 0);
    }
}
