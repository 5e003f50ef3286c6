//! Token Issuance
//!
//! Minting and persisting of access tokens, refresh tokens and
//! authorization codes.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::EngineResult;
use crate::flows::GrantEngine;
use crate::types::{Credential, CredentialKind, ScopeSet, TokenResponse};

/// Whether a grant also receives a refresh token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssuePolicy {
    /// Access token only (implicit grant).
    AccessTokenOnly,
    /// Access token and refresh token (token endpoint grants).
    WithRefreshToken,
}

impl IssuePolicy {
    pub fn issues_refresh_token(&self) -> bool {
        matches!(self, Self::WithRefreshToken)
    }
}

/// What a set of tokens is issued for.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Grant<'a> {
    pub client_id: &'a str,
    pub resource_owner_id: Option<&'a str>,
    pub scope: &'a ScopeSet,
    /// Signature of the authorization code the tokens derive from.
    pub parent_code: Option<&'a str>,
    pub policy: IssuePolicy,
}

impl GrantEngine {
    /// Issue an access token and, depending on the policy, a refresh token.
    ///
    /// Both tokens are generated before anything is written. If storing the
    /// refresh token fails the access token is removed again.
    pub(crate) async fn issue_tokens(&self, grant: Grant<'_>) -> EngineResult<TokenResponse> {
        let access_token = self.codec.generate()?;
        let refresh_token = if grant.policy.issues_refresh_token() {
            Some(self.codec.generate()?)
        } else {
            None
        };

        let now = Utc::now();
        let access_signature = access_token.signature();
        self.store
            .put(
                CredentialKind::AccessToken,
                &access_signature,
                self.credential(&grant, CredentialKind::AccessToken, now),
            )
            .await?;

        if let Some(refresh_token) = &refresh_token {
            let stored = self
                .store
                .put(
                    CredentialKind::RefreshToken,
                    &refresh_token.signature(),
                    self.credential(&grant, CredentialKind::RefreshToken, now),
                )
                .await;

            if let Err(e) = stored {
                if let Err(cleanup) = self
                    .store
                    .delete(CredentialKind::AccessToken, &access_signature)
                    .await
                {
                    warn!(error = %cleanup, "failed to roll back access token");
                }
                return Err(e.into());
            }
            self.metrics
                .record_token_issued(CredentialKind::RefreshToken.as_str());
        }
        self.metrics
            .record_token_issued(CredentialKind::AccessToken.as_str());

        debug!(
            client_id = grant.client_id,
            scope = %grant.scope,
            refresh_token = refresh_token.is_some(),
            "issued tokens"
        );

        Ok(TokenResponse::bearer(
            access_token.to_string(),
            self.config.lifespan(CredentialKind::AccessToken).as_secs(),
        )
        .with_refresh_token(refresh_token.map(|t| t.to_string()))
        .with_scope(grant.scope.clone()))
    }

    /// Issue an authorization code bound to a redirect URI.
    pub(crate) async fn issue_authorization_code(
        &self,
        client_id: &str,
        resource_owner_id: &str,
        scope: &ScopeSet,
        redirect_uri: &str,
    ) -> EngineResult<String> {
        let code = self.codec.generate()?;
        let expires_at = self
            .config
            .expires_at(CredentialKind::AuthorizationCode, Utc::now());

        let credential = Credential::new(client_id, scope.clone(), expires_at)
            .with_resource_owner(Some(resource_owner_id))
            .with_redirect_uri(redirect_uri);

        self.store
            .put(CredentialKind::AuthorizationCode, &code.signature(), credential)
            .await?;
        self.metrics
            .record_token_issued(CredentialKind::AuthorizationCode.as_str());

        debug!(client_id, scope = %scope, "issued authorization code");
        Ok(code.to_string())
    }

    fn credential(&self, grant: &Grant<'_>, kind: CredentialKind, now: DateTime<Utc>) -> Credential {
        Credential::new(grant.client_id, grant.scope.clone(), self.config.expires_at(kind, now))
            .with_resource_owner(grant.resource_owner_id)
            .with_parent_code(grant.parent_code)
    }
}
