//! Grant Types
//!
//! Token endpoint requests.

use secrecy::SecretString;
use std::fmt;

use crate::core::transport::{HttpMethod, HttpRequest};
use crate::error::OAuth2Error;
use crate::types::{ClientCredentials, ScopeSet};

/// Grant types accepted at the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantType {
    Password,
    ClientCredentials,
    AuthorizationCode,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::ClientCredentials => "client_credentials",
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "password" => Some(Self::Password),
            "client_credentials" => Some(Self::ClientCredentials),
            "authorization_code" => Some(Self::AuthorizationCode),
            "refresh_token" => Some(Self::RefreshToken),
            _ => None,
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed token endpoint request.
#[derive(Clone, Debug)]
pub struct TokenRequest {
    pub grant_type: GrantType,
    pub client: ClientCredentials,
    pub scope: ScopeSet,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenRequest {
    /// Create a request for `grant_type` with empty parameters.
    pub fn new(grant_type: GrantType, client: ClientCredentials) -> Self {
        Self {
            grant_type,
            client,
            scope: ScopeSet::new(),
            username: None,
            password: None,
            code: None,
            redirect_uri: None,
            refresh_token: None,
        }
    }

    /// Parse a token request.
    pub fn parse(request: &HttpRequest) -> Result<Self, OAuth2Error> {
        if request.method != HttpMethod::Post {
            return Err(OAuth2Error::invalid_request("invalid HTTP method"));
        }

        let grant_type = request
            .form
            .get("grant_type")
            .filter(|g| !g.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("missing grant type"))?;
        let grant_type = GrantType::parse(grant_type)
            .ok_or_else(|| OAuth2Error::unsupported_grant_type(""))?;

        let client = ClientCredentials::from_request(request)?;
        let field = |name: &str| {
            request
                .form
                .get(name)
                .filter(|v| !v.is_empty())
                .cloned()
        };

        Ok(Self {
            grant_type,
            client,
            scope: ScopeSet::parse(request.form.get("scope").map(String::as_str).unwrap_or_default()),
            username: field("username"),
            password: field("password").map(SecretString::new),
            code: field("code"),
            redirect_uri: field("redirect_uri"),
            refresh_token: field("refresh_token"),
        })
    }
}
