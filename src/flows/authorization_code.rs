//! Authorization Code Flow
//!
//! RFC 6749 Section 4.1.3 - Access Token Request with an authorization code.
//!
//! Codes are single use. Presenting a code a second time revokes every
//! token that was issued for it (RFC 6749 Section 10.5). Tokens are issued
//! before the code is marked used; a failed issuance leaves the code
//! redeemable.

use tracing::warn;

use crate::error::{EngineResult, OAuth2Error};
use crate::flows::issuance::{Grant, IssuePolicy};
use crate::flows::GrantEngine;
use crate::token::storage::MarkUsed;
use crate::types::{Client, CredentialKind, TokenRequest, TokenResponse};

const UNKNOWN_CODE: &str = "unknown authorization code";

impl GrantEngine {
    pub(crate) async fn handle_authorization_code_grant(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> EngineResult<TokenResponse> {
        let code = self
            .codec
            .parse(request.code.as_deref().unwrap_or_default())
            .map_err(|_| OAuth2Error::invalid_request("a valid authorization code must be provided"))?;
        let signature = code.signature();

        let stored = self
            .store
            .get(CredentialKind::AuthorizationCode, &signature)
            .await?
            .ok_or_else(|| OAuth2Error::invalid_grant(UNKNOWN_CODE))?;

        if stored.used {
            if let MarkUsed::Replayed { revoked } = self.store.mark_used(&signature).await? {
                warn!(
                    client_id = %client.id,
                    revoked,
                    "authorization code replayed, derived tokens revoked"
                );
                self.metrics.record_replay_detected(revoked);
            }
            return Err(OAuth2Error::invalid_grant(UNKNOWN_CODE).into());
        }

        if stored.is_expired() {
            return Err(OAuth2Error::invalid_grant("expired authorization code").into());
        }

        if stored.client_id != client.id {
            return Err(OAuth2Error::invalid_grant("invalid authorization code ownership").into());
        }

        let presented_uri = request.redirect_uri.as_deref().unwrap_or_default();
        if stored.redirect_uri.as_deref().unwrap_or_default() != presented_uri {
            return Err(OAuth2Error::invalid_grant("changed redirect uri").into());
        }

        if !stored.scope.includes(&request.scope) {
            return Err(
                OAuth2Error::invalid_scope("scope exceeds the originally granted scope").into(),
            );
        }

        let response = self
            .issue_tokens(Grant {
                client_id: &client.id,
                resource_owner_id: stored.resource_owner_id.as_deref(),
                scope: &stored.scope,
                parent_code: Some(&signature),
                policy: IssuePolicy::WithRefreshToken,
            })
            .await?;

        match self.store.mark_used(&signature).await {
            Ok(MarkUsed::Marked) => Ok(response),
            Ok(MarkUsed::Replayed { revoked }) => {
                warn!(
                    client_id = %client.id,
                    revoked,
                    "authorization code redeemed concurrently, derived tokens revoked"
                );
                self.metrics.record_replay_detected(revoked);
                Err(OAuth2Error::invalid_grant(UNKNOWN_CODE).into())
            }
            Ok(MarkUsed::NotFound) => {
                self.revoke_derived_tokens(&signature).await;
                Err(OAuth2Error::invalid_grant(UNKNOWN_CODE).into())
            }
            Err(e) => {
                self.revoke_derived_tokens(&signature).await;
                Err(e.into())
            }
        }
    }

    async fn revoke_derived_tokens(&self, code_signature: &str) {
        if let Err(e) = self.store.revoke_derived(code_signature).await {
            warn!(error = %e, "failed to revoke tokens of an unredeemed code");
        }
    }
}
