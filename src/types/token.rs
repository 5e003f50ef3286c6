//! Token Types
//!
//! Stored credentials and the responses handed out for them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ScopeSet;

/// Kind of stored credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    AccessToken,
    RefreshToken,
    AuthorizationCode,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::AuthorizationCode => "authorization_code",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record kept for an issued access token, refresh token or code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Client the credential was issued to.
    pub client_id: String,
    /// Resource owner, absent for client credentials grants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_owner_id: Option<String>,
    /// Granted scope.
    pub scope: ScopeSet,
    /// Expiration time.
    pub expires_at: DateTime<Utc>,
    /// Redirect URI bound to an authorization code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    /// Signature of the authorization code this credential derives from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
    /// Set once an authorization code has been redeemed.
    #[serde(default)]
    pub used: bool,
}

impl Credential {
    pub fn new(client_id: impl Into<String>, scope: ScopeSet, expires_at: DateTime<Utc>) -> Self {
        Self {
            client_id: client_id.into(),
            resource_owner_id: None,
            scope,
            expires_at,
            redirect_uri: None,
            parent_code: None,
            used: false,
        }
    }

    pub fn with_resource_owner(mut self, owner: Option<impl Into<String>>) -> Self {
        self.resource_owner_id = owner.map(Into::into);
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn with_parent_code(mut self, code: Option<impl Into<String>>) -> Self {
        self.parent_code = code.map(Into::into);
        self
    }

    /// Check if the credential is expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check if the credential is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Get remaining lifetime in seconds, zero once expired.
    pub fn remaining_lifetime(&self) -> i64 {
        let remaining = self.expires_at - Utc::now();
        if remaining > Duration::zero() {
            remaining.num_seconds()
        } else {
            0
        }
    }
}

/// Where a token response is delivered when it is not a JSON body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectTarget {
    pub uri: String,
    /// Encode parameters in the fragment instead of the query.
    pub use_fragment: bool,
}

/// Successful token response.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "ScopeSet::is_empty")]
    pub scope: ScopeSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Redirect delivery target (implicit grant).
    #[serde(skip)]
    pub redirect: Option<RedirectTarget>,
}

impl TokenResponse {
    /// Create a bearer token response.
    pub fn bearer(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            token_type: "bearer".to_string(),
            access_token: access_token.into(),
            expires_in,
            refresh_token: None,
            scope: ScopeSet::new(),
            state: None,
            redirect: None,
        }
    }

    pub fn with_refresh_token(mut self, token: Option<String>) -> Self {
        self.refresh_token = token;
        self
    }

    pub fn with_scope(mut self, scope: ScopeSet) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_state<S: Into<String>>(mut self, state: Option<S>) -> Self {
        self.state = state.map(Into::into).filter(|s| !s.is_empty());
        self
    }

    /// Deliver the response by redirect.
    pub fn with_redirect(mut self, uri: impl Into<String>, use_fragment: bool) -> Self {
        self.redirect = Some(RedirectTarget {
            uri: uri.into(),
            use_fragment,
        });
        self
    }

    /// Ordered parameter list used for redirect delivery.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("token_type", self.token_type.clone()),
            ("access_token", self.access_token.clone()),
            ("expires_in", self.expires_in.to_string()),
        ];
        if let Some(refresh_token) = &self.refresh_token {
            params.push(("refresh_token", refresh_token.clone()));
        }
        if !self.scope.is_empty() {
            params.push(("scope", self.scope.to_string()));
        }
        if let Some(state) = &self.state {
            params.push(("state", state.clone()));
        }
        params
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("scope", &self.scope)
            .field("state", &self.state)
            .field("redirect", &self.redirect)
            .finish()
    }
}

/// Authorization code response, delivered in the redirect query.
#[derive(Clone, PartialEq, Eq)]
pub struct CodeResponse {
    pub code: String,
    pub state: Option<String>,
}

impl CodeResponse {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            state: None,
        }
    }

    pub fn with_state<S: Into<String>>(mut self, state: Option<S>) -> Self {
        self.state = state.map(Into::into).filter(|s| !s.is_empty());
        self
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("code", self.code.clone())];
        if let Some(state) = &self.state {
            params.push(("state", state.clone()));
        }
        params
    }
}

impl fmt::Debug for CodeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeResponse")
            .field("code", &"[REDACTED]")
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_expiry() {
        let now = Utc::now();
        let credential = Credential::new("client", ScopeSet::parse("foo"), now);
        assert!(credential.is_expired_at(now));
        assert!(!credential.is_expired_at(now - Duration::seconds(1)));
        assert_eq!(credential.remaining_lifetime(), 0);

        let credential =
            Credential::new("client", ScopeSet::new(), now + Duration::seconds(3600));
        assert!(!credential.is_expired());
        assert!(credential.remaining_lifetime() > 3590);
    }

    #[test]
    fn test_token_response_json() {
        let response = TokenResponse::bearer("foo", 3600)
            .with_refresh_token(Some("bar".to_string()))
            .with_scope(ScopeSet::parse("baz qux"))
            .with_state(Some("xyz"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "token_type": "bearer",
                "access_token": "foo",
                "expires_in": 3600,
                "refresh_token": "bar",
                "scope": "baz qux",
                "state": "xyz",
            })
        );
    }

    #[test]
    fn test_token_response_json_omits_optional_fields() {
        let response = TokenResponse::bearer("foo", 60).with_redirect("http://example.com", true);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "token_type": "bearer",
                "access_token": "foo",
                "expires_in": 60,
            })
        );
    }

    #[test]
    fn test_token_response_params() {
        let response = TokenResponse::bearer("foo", 60).with_scope(ScopeSet::parse("bar"));
        assert_eq!(
            response.params(),
            vec![
                ("token_type", "bearer".to_string()),
                ("access_token", "foo".to_string()),
                ("expires_in", "60".to_string()),
                ("scope", "bar".to_string()),
            ]
        );
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let response =
            TokenResponse::bearer("secret-access", 60).with_refresh_token(Some("secret-refresh".into()));
        let debug = format!("{:?}", response);
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));

        let code = CodeResponse::new("secret-code").with_state(Some("xyz"));
        assert!(!format!("{:?}", code).contains("secret-code"));
        assert_eq!(
            code.params(),
            vec![("code", "secret-code".to_string()), ("state", "xyz".to_string())]
        );
    }
}
