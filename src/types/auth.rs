//! Authorization Types
//!
//! Requests of the authorization endpoint and client credentials presented
//! to the token, revocation and introspection endpoints.

use secrecy::SecretString;
use std::fmt;

use crate::core::transport::{HttpMethod, HttpRequest};
use crate::error::OAuth2Error;
use crate::types::ScopeSet;

/// Response type requested at the authorization endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseType {
    /// Implicit grant.
    Token,
    /// Authorization code grant.
    Code,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Code => "code",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "token" => Some(Self::Token),
            "code" => Some(Self::Code),
            _ => None,
        }
    }

    /// Redirect parameters travel in the fragment for the implicit grant.
    pub fn uses_fragment(&self) -> bool {
        matches!(self, Self::Token)
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed authorization endpoint request.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
    pub method: HttpMethod,
    pub response_type: ResponseType,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: ScopeSet,
    pub state: Option<String>,
    /// Resource owner credentials submitted with the approval form.
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl AuthorizationRequest {
    /// Parse an authorization request. Failures are delivered directly as
    /// the redirect URI has not been validated yet.
    pub fn parse(request: &HttpRequest) -> Result<Self, OAuth2Error> {
        let state = request.param("state").map(str::to_string);

        if !matches!(request.method, HttpMethod::Get | HttpMethod::Post) {
            return Err(OAuth2Error::invalid_request("invalid HTTP method").with_state(state));
        }

        let response_type = match request.param("response_type") {
            Some(value) => ResponseType::parse(value).ok_or_else(|| {
                OAuth2Error::unsupported_response_type("").with_state(state.clone())
            })?,
            None => {
                return Err(
                    OAuth2Error::invalid_request("missing response type").with_state(state)
                )
            }
        };

        Ok(Self {
            method: request.method,
            response_type,
            client_id: request.param("client_id").unwrap_or_default().to_string(),
            redirect_uri: request.param("redirect_uri").unwrap_or_default().to_string(),
            scope: ScopeSet::parse(request.param("scope").unwrap_or_default()),
            username: request.param("username").map(str::to_string),
            password: request
                .param("password")
                .map(|p| SecretString::new(p.to_string())),
            state,
        })
    }
}

/// Client identifier and secret presented by a client.
#[derive(Clone, Debug)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Option<SecretString>,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: Option<&str>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.map(|s| SecretString::new(s.to_string())),
        }
    }

    /// Read credentials from HTTP Basic authentication, falling back to the
    /// `client_id` and `client_secret` form fields.
    pub fn from_request(request: &HttpRequest) -> Result<Self, OAuth2Error> {
        if let Some((client_id, client_secret)) = request.basic_credentials() {
            let secret = (!client_secret.is_empty()).then_some(client_secret.as_str());
            return Ok(Self::new(client_id, secret));
        }

        match request.form.get("client_id").filter(|id| !id.is_empty()) {
            Some(client_id) => Ok(Self::new(
                client_id.as_str(),
                request
                    .form
                    .get("client_secret")
                    .map(String::as_str)
                    .filter(|s| !s.is_empty()),
            )),
            None => Err(OAuth2Error::invalid_request("missing or invalid client credentials")),
        }
    }
}
