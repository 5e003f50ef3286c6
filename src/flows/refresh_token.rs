//! Refresh Token Flow
//!
//! RFC 6749 Section 6 - Refreshing an Access Token. Refresh tokens rotate:
//! the presented token is consumed and a new one is issued. A failed
//! issuance puts the presented token back.

use tracing::warn;

use crate::error::{EngineResult, OAuth2Error};
use crate::flows::issuance::{Grant, IssuePolicy};
use crate::flows::GrantEngine;
use crate::types::{Client, CredentialKind, TokenRequest, TokenResponse};

const UNKNOWN_REFRESH_TOKEN: &str = "unknown refresh token";

impl GrantEngine {
    pub(crate) async fn handle_refresh_token_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> EngineResult<TokenResponse> {
        let token = self
            .codec
            .parse(request.refresh_token.as_deref().unwrap_or_default())
            .map_err(|_| OAuth2Error::invalid_request("a valid refresh token must be provided"))?;
        let signature = token.signature();

        let stored = self
            .store
            .get(CredentialKind::RefreshToken, &signature)
            .await?
            .ok_or_else(|| OAuth2Error::invalid_grant(UNKNOWN_REFRESH_TOKEN))?;

        if stored.is_expired() {
            return Err(OAuth2Error::invalid_grant("expired refresh token").into());
        }

        if stored.client_id != client.id {
            return Err(OAuth2Error::invalid_grant("invalid refresh token ownership").into());
        }

        let scope = if request.scope.is_empty() {
            stored.scope.clone()
        } else {
            request.scope.clone()
        };
        if !stored.scope.includes(&scope) {
            return Err(
                OAuth2Error::invalid_scope("scope exceeds the originally granted scope").into(),
            );
        }

        let Some(consumed) = self
            .store
            .take(CredentialKind::RefreshToken, &signature)
            .await?
        else {
            return Err(OAuth2Error::invalid_grant(UNKNOWN_REFRESH_TOKEN).into());
        };

        let issued = self
            .issue_tokens(Grant {
                client_id: &client.id,
                resource_owner_id: stored.resource_owner_id.as_deref(),
                scope: &scope,
                parent_code: stored.parent_code.as_deref(),
                policy: IssuePolicy::WithRefreshToken,
            })
            .await;

        if issued.is_err() {
            if let Err(e) = self
                .store
                .put(CredentialKind::RefreshToken, &signature, consumed)
                .await
            {
                warn!(client_id = %client.id, error = %e, "failed to restore refresh token");
            }
        }
        issued
    }
}
