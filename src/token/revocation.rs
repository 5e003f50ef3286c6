//! Token Revocation
//!
//! RFC 7009 - OAuth 2.0 Token Revocation.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{EngineResult, OAuth2Error};
use crate::flows::GrantEngine;
use crate::types::{RevocationRequest, TokenTypeHint};

/// Token revoker interface.
#[async_trait]
pub trait TokenRevoker: Send + Sync {
    /// Revoke an access or refresh token. Unknown tokens are not an error.
    async fn revoke(&self, request: RevocationRequest) -> EngineResult<()>;
}

#[async_trait]
impl TokenRevoker for GrantEngine {
    #[instrument(skip(self, request), fields(client_id = %request.client.client_id))]
    async fn revoke(&self, request: RevocationRequest) -> EngineResult<()> {
        let result = self.revoke_token(&request).await;
        if let Err(e) = &result {
            debug!(error = e.error_code(), "revocation rejected");
            self.metrics.record_error("revoke", e.error_code());
        }
        result
    }
}

impl GrantEngine {
    async fn revoke_token(&self, request: &RevocationRequest) -> EngineResult<()> {
        let client = self.authenticate_client(&request.client).await?;

        let token = self
            .codec
            .parse(&request.token)
            .map_err(|_| OAuth2Error::invalid_request("a valid token must be provided"))?;
        let signature = token.signature();

        for kind in TokenTypeHint::search_order(request.token_type_hint) {
            let Some(credential) = self.store.get(kind, &signature).await? else {
                continue;
            };

            if credential.client_id != client.id {
                return Err(OAuth2Error::invalid_client("wrong client").into());
            }

            self.store.delete(kind, &signature).await?;
            self.metrics.record_token_revocation(true);
            debug!(kind = %kind, "token revoked");
            return Ok(());
        }

        self.metrics.record_token_revocation(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::flows::test_support::*;
    use crate::types::{
        ClientCredentials, CredentialKind, GrantType, ScopeSet, TokenLookupRequest, TokenRequest,
        TokenResponse,
    };

    async fn tokens(engine: &GrantEngine) -> TokenResponse {
        let mut request = TokenRequest::new(GrantType::ClientCredentials, client1());
        request.scope = ScopeSet::parse("foo");
        engine.token(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_revoke_access_token() {
        let (engine, store) = engine();
        let response = tokens(&engine).await;

        engine
            .revoke(TokenLookupRequest::new(client1(), &response.access_token))
            .await
            .unwrap();
        assert_eq!(store.count(CredentialKind::AccessToken).unwrap(), 0);
        assert_eq!(store.count(CredentialKind::RefreshToken).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_revoke_refresh_token_with_hint() {
        let (engine, store) = engine();
        let response = tokens(&engine).await;

        let request = TokenLookupRequest::new(client1(), response.refresh_token.unwrap())
            .with_hint(TokenTypeHint::RefreshToken);
        engine.revoke(request).await.unwrap();
        assert_eq!(store.count(CredentialKind::RefreshToken).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_succeeds() {
        let (engine, _) = engine();
        let unknown = engine.codec().generate().unwrap().to_string();

        assert!(engine
            .revoke(TokenLookupRequest::new(client1(), unknown))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_revoke_foreign_token() {
        let (engine, store) = engine();
        let response = tokens(&engine).await;

        let error = engine
            .revoke(TokenLookupRequest::new(
                ClientCredentials::new("client2", None),
                &response.access_token,
            ))
            .await
            .unwrap_err()
            .into_oauth2();
        assert_eq!(error.code, ErrorCode::InvalidClient);
        assert_eq!(store.count(CredentialKind::AccessToken).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_revoke_malformed_token() {
        let (engine, _) = engine();

        let error = engine
            .revoke(TokenLookupRequest::new(client1(), "foo"))
            .await
            .unwrap_err()
            .into_oauth2();
        assert_eq!(error.code, ErrorCode::InvalidRequest);
    }
}
