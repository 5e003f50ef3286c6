//! Password Flow
//!
//! RFC 6749 Section 4.3 - Resource Owner Password Credentials Grant.

use crate::error::EngineResult;
use crate::flows::issuance::{Grant, IssuePolicy};
use crate::flows::GrantEngine;
use crate::types::{Client, TokenRequest, TokenResponse};

impl GrantEngine {
    pub(crate) async fn handle_password_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> EngineResult<TokenResponse> {
        let owner = self
            .authenticate_owner(request.username.as_deref(), request.password.as_ref())
            .await?;
        self.check_allowed_scope(client, &request.scope)?;

        self.issue_tokens(Grant {
            client_id: &client.id,
            resource_owner_id: Some(&owner.username),
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
    use crate::types::{CredentialKind, GrantType, ScopeSet, TokenRequest};
    use secrecy::SecretString;

    fn request(username: &str, password: &str, scope: &str) -> TokenRequest {
        let mut request = TokenRequest::new(GrantType::Password, client1());
        request.username = Some(username.to_string());
        request.password = Some(SecretString::new(password.to_string()));
        request.scope = ScopeSet::parse(scope);
        request
    }

    #[tokio::test]
    async fn test_password_grant() {
        let (engine, store) = engine();

        let response = engine.token(request("user1", "bar", "foo")).await.unwrap();
        assert_eq!(response.scope, ScopeSet::parse("foo"));
        assert!(response.refresh_token.is_some());

        let signature = engine.codec().parse(&response.access_token).unwrap().signature();
        let stored = store
            .get(CredentialKind::AccessToken, &signature)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.resource_owner_id.as_deref(), Some("user1"));
    }

    #[tokio::test]
    async fn test_password_grant_wrong_password() {
        let (engine, store) = engine();

        let error = engine.token(request("user1", "baz", "foo")).await.unwrap_err();
        assert_eq!(error.into_oauth2().code, ErrorCode::AccessDenied);
        assert_eq!(store.count(CredentialKind::AccessToken).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_password_grant_scope_not_allowed() {
        let (engine, store) = engine();

        let error = engine.token(request("user1", "bar", "foo baz")).await.unwrap_err();
        assert_eq!(error.into_oauth2().code, ErrorCode::InvalidScope);
        assert_eq!(store.count(CredentialKind::AccessToken).unwrap(), 0);
    }
}
