//! Introspection Types
//!
//! Types for OAuth2 Token Introspection (RFC 7662) and Revocation (RFC 7009).

use serde::{Deserialize, Serialize};

use crate::core::transport::{HttpMethod, HttpRequest};
use crate::error::OAuth2Error;
use crate::types::{ClientCredentials, CredentialKind};

/// Token type hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTypeHint {
    AccessToken,
    RefreshToken,
}

impl TokenTypeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "access_token" => Some(Self::AccessToken),
            "refresh_token" => Some(Self::RefreshToken),
            _ => None,
        }
    }

    /// Credential kinds to search, hinted kind first.
    pub fn search_order(hint: Option<Self>) -> [CredentialKind; 2] {
        match hint {
            Some(Self::RefreshToken) => [CredentialKind::RefreshToken, CredentialKind::AccessToken],
            _ => [CredentialKind::AccessToken, CredentialKind::RefreshToken],
        }
    }
}

/// Request naming a token at the revocation or introspection endpoint.
#[derive(Clone, Debug)]
pub struct TokenLookupRequest {
    pub client: ClientCredentials,
    pub token: String,
    pub token_type_hint: Option<TokenTypeHint>,
}

/// Token revocation request.
pub type RevocationRequest = TokenLookupRequest;

/// Token introspection request.
pub type IntrospectionRequest = TokenLookupRequest;

impl TokenLookupRequest {
    pub fn new(client: ClientCredentials, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            token_type_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: TokenTypeHint) -> Self {
        self.token_type_hint = Some(hint);
        self
    }

    /// Parse a revocation or introspection request.
    pub fn parse(request: &HttpRequest) -> Result<Self, OAuth2Error> {
        if request.method != HttpMethod::Post {
            return Err(OAuth2Error::invalid_request("invalid HTTP method"));
        }

        let token = request
            .form
            .get("token")
            .filter(|t| !t.is_empty())
            .cloned()
            .ok_or_else(|| OAuth2Error::invalid_request("missing token"))?;

        let token_type_hint = match request.form.get("token_type_hint").filter(|h| !h.is_empty()) {
            Some(hint) => Some(
                TokenTypeHint::parse(hint)
                    .ok_or_else(|| OAuth2Error::unsupported_token_type(""))?,
            ),
            None => None,
        };

        Ok(Self {
            client: ClientCredentials::from_request(request)?,
            token,
            token_type_hint,
        })
    }
}

/// Token introspection response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionResponse {
    /// Whether the token is active.
    pub active: bool,
    /// Granted scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Client the token was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Resource owner username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Token type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Expiration timestamp (Unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl IntrospectionResponse {
    /// Response for unknown, expired or foreign tokens.
    pub fn inactive() -> Self {
        Self::default()
    }
}
