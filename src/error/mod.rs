//! OAuth2 Error Types
//!
//! Two closed protocol taxonomies (authorization/token endpoint errors and
//! bearer resource errors) plus the internal error hierarchy that is folded
//! into `server_error` before it reaches a client.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Machine-readable error codes of the authorization and token endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidClient,
    InvalidGrant,
    InvalidScope,
    UnauthorizedClient,
    UnsupportedGrantType,
    UnsupportedResponseType,
    UnsupportedTokenType,
    AccessDenied,
    ServerError,
    TemporarilyUnavailable,
}

impl ErrorCode {
    /// Protocol string of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidScope => "invalid_scope",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::UnsupportedTokenType => "unsupported_token_type",
            Self::AccessDenied => "access_denied",
            Self::ServerError => "server_error",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
        }
    }

    /// HTTP status used when the error is delivered directly.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidClient => 401,
            Self::AccessDenied => 403,
            Self::ServerError => 500,
            Self::TemporarilyUnavailable => 503,
            _ => 400,
        }
    }

    /// Parse a protocol string into a known code.
    pub fn parse(value: &str) -> Option<Self> {
        let code = match value {
            "invalid_request" => Self::InvalidRequest,
            "invalid_client" => Self::InvalidClient,
            "invalid_grant" => Self::InvalidGrant,
            "invalid_scope" => Self::InvalidScope,
            "unauthorized_client" => Self::UnauthorizedClient,
            "unsupported_grant_type" => Self::UnsupportedGrantType,
            "unsupported_response_type" => Self::UnsupportedResponseType,
            "unsupported_token_type" => Self::UnsupportedTokenType,
            "access_denied" => Self::AccessDenied,
            "server_error" => Self::ServerError,
            "temporarily_unavailable" => Self::TemporarilyUnavailable,
            _ => return None,
        };
        Some(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol error of the authorization and token endpoints.
///
/// Serializes to the JSON error document
/// `{"error", "error_description"?, "error_uri"?, "state"?}`.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize)]
#[error("{}: {}", .code, .description.as_deref().unwrap_or_default())]
pub struct OAuth2Error {
    /// Error code.
    #[serde(rename = "error")]
    pub code: ErrorCode,
    /// Human readable description.
    #[serde(rename = "error_description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Link to a page describing the error.
    #[serde(rename = "error_uri", skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// State echoed back to the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl OAuth2Error {
    /// Create an error with an optional description. An empty description
    /// is treated as absent.
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            code,
            description: (!description.is_empty()).then_some(description),
            uri: None,
            state: None,
        }
    }

    /// Create an error carrying only its code.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, String::new())
    }

    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, description)
    }

    pub fn invalid_client(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidClient, description)
    }

    pub fn invalid_grant(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidGrant, description)
    }

    pub fn invalid_scope(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidScope, description)
    }

    pub fn unauthorized_client(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnauthorizedClient, description)
    }

    pub fn unsupported_grant_type(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedGrantType, description)
    }

    pub fn unsupported_response_type(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedResponseType, description)
    }

    pub fn unsupported_token_type(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedTokenType, description)
    }

    pub fn access_denied(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::AccessDenied, description)
    }

    pub fn server_error(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServerError, description)
    }

    pub fn temporarily_unavailable(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::TemporarilyUnavailable, description)
    }

    /// Attach the client supplied state. Empty states are dropped.
    pub fn with_state<S: Into<String>>(mut self, state: Option<S>) -> Self {
        self.state = state.map(Into::into).filter(|s| !s.is_empty());
        self
    }

    /// Attach an error URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// HTTP status for direct delivery.
    pub fn status(&self) -> u16 {
        self.code.status()
    }

    /// Ordered parameter list used for redirect delivery.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("error", self.code.as_str().to_string())];
        if let Some(description) = &self.description {
            params.push(("error_description", description.clone()));
        }
        if let Some(uri) = &self.uri {
            params.push(("error_uri", uri.clone()));
        }
        if let Some(state) = &self.state {
            params.push(("state", state.clone()));
        }
        params
    }
}

/// Error codes of the bearer token usage taxonomy (RFC 6750).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BearerErrorCode {
    InvalidRequest,
    InvalidToken,
    InsufficientScope,
}

impl BearerErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidToken => "invalid_token",
            Self::InsufficientScope => "insufficient_scope",
        }
    }
}

impl fmt::Display for BearerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unsuccessful bearer token authentication.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{}: {}", .code.map(|c| c.as_str()).unwrap_or("unauthorized"), .description.as_deref().unwrap_or_default())]
pub struct BearerError {
    pub code: Option<BearerErrorCode>,
    pub description: Option<String>,
    pub uri: Option<String>,
    pub realm: Option<String>,
    /// Scope required by the resource (insufficient scope only).
    pub scope: Option<String>,
    pub status: u16,
}

impl BearerError {
    fn with_code(code: BearerErrorCode, description: impl Into<String>, status: u16) -> Self {
        let description = description.into();
        Self {
            code: Some(code),
            description: (!description.is_empty()).then_some(description),
            uri: None,
            realm: None,
            scope: None,
            status,
        }
    }

    /// The resource needs authentication but none was presented.
    pub fn protected_resource() -> Self {
        Self {
            code: None,
            description: None,
            uri: None,
            realm: None,
            scope: None,
            status: 401,
        }
    }

    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::with_code(BearerErrorCode::InvalidRequest, description, 400)
    }

    pub fn invalid_token(description: impl Into<String>) -> Self {
        Self::with_code(BearerErrorCode::InvalidToken, description, 401)
    }

    pub fn insufficient_scope(required_scope: impl Into<String>) -> Self {
        let mut error = Self::with_code(BearerErrorCode::InsufficientScope, String::new(), 403);
        let scope = required_scope.into();
        error.scope = (!scope.is_empty()).then_some(scope);
        error
    }

    /// Internal failure; rendered as a bare 500 without a challenge.
    pub fn server_error() -> Self {
        Self {
            status: 500,
            ..Self::protected_resource()
        }
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Challenge parameters as `key="value"`, sorted alphabetically.
    pub fn params(&self) -> String {
        let mut params: Vec<String> = [
            ("error", self.code.map(|c| c.as_str().to_string())),
            ("error_description", self.description.clone()),
            ("error_uri", self.uri.clone()),
            ("realm", self.realm.clone()),
            ("scope", self.scope.clone()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| format!(r#"{}="{}""#, key, v)))
        .collect();

        params.sort();
        params.join(", ")
    }
}

/// Token codec failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed token")]
    Malformed,

    #[error("secure random source failed")]
    Entropy,
}

/// Credential store failure.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("Storage lock poisoned")]
    Poisoned,

    #[error("Write failed: {message}")]
    WriteFailed { message: String },
}

/// Client or resource owner lookup failure.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry unavailable: {message}")]
    Unavailable { message: String },
}

/// Configuration error.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Token key length {length} is below the minimum of {minimum} bytes")]
    KeyTooShort { length: usize, minimum: usize },

    #[error("Invalid lifespan for {field}: {message}")]
    InvalidLifespan { field: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Root error type of the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    OAuth2(#[from] OAuth2Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Token codec error: {0}")]
    Codec(#[from] CodecError),
}

impl EngineError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::OAuth2(e) => e.code.as_str(),
            Self::Storage(_) => "OAUTH2_STORAGE",
            Self::Registry(_) => "OAUTH2_REGISTRY",
            Self::Codec(_) => "OAUTH2_CODEC",
        }
    }

    /// Check if the error is internal (not a protocol classification).
    pub fn is_internal(&self) -> bool {
        !matches!(self, Self::OAuth2(_))
    }

    /// Fold into the protocol taxonomy. Internal failures become a bare
    /// `server_error` so no internal detail reaches the client.
    pub fn into_oauth2(self) -> OAuth2Error {
        match self {
            Self::OAuth2(error) => error,
            _ => OAuth2Error::from_code(ErrorCode::ServerError),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_builders() {
        let matrix = [
            (OAuth2Error::invalid_request("foo"), "invalid_request", 400),
            (OAuth2Error::invalid_client("foo"), "invalid_client", 401),
            (OAuth2Error::invalid_grant("foo"), "invalid_grant", 400),
            (OAuth2Error::invalid_scope("foo"), "invalid_scope", 400),
            (OAuth2Error::unauthorized_client("foo"), "unauthorized_client", 400),
            (OAuth2Error::unsupported_grant_type("foo"), "unsupported_grant_type", 400),
            (OAuth2Error::unsupported_response_type("foo"), "unsupported_response_type", 400),
            (OAuth2Error::access_denied("foo"), "access_denied", 403),
            (OAuth2Error::server_error("foo"), "server_error", 500),
            (OAuth2Error::temporarily_unavailable("foo"), "temporarily_unavailable", 503),
        ];

        for (error, code, status) in matrix {
            assert_eq!(error.code.as_str(), code);
            assert_eq!(error.status(), status, "{}", code);
            assert_eq!(error.description.as_deref(), Some("foo"));
            assert_eq!(ErrorCode::parse(code), Some(error.code));
        }
    }

    #[test]
    fn test_error_display() {
        let error = OAuth2Error::invalid_request("foo");
        assert_eq!(error.to_string(), "invalid_request: foo");
    }

    #[test]
    fn test_error_params() {
        let error = OAuth2Error::invalid_request("foo")
            .with_state(Some("bar"))
            .with_uri("http://example.com");

        assert_eq!(
            error.params(),
            vec![
                ("error", "invalid_request".to_string()),
                ("error_description", "foo".to_string()),
                ("error_uri", "http://example.com".to_string()),
                ("state", "bar".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_json_omits_empty_fields() {
        let error = OAuth2Error::invalid_scope("");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "invalid_scope" }));
    }

    #[test]
    fn test_empty_state_is_dropped() {
        let error = OAuth2Error::access_denied("").with_state(Some(""));
        assert!(error.state.is_none());
    }

    #[test]
    fn test_internal_errors_fold_into_bare_server_error() {
        let error = EngineError::Storage(StorageError::Unavailable {
            message: "connection refused to db-1".to_string(),
        });
        assert!(error.is_internal());

        let folded = error.into_oauth2();
        assert_eq!(folded.code, ErrorCode::ServerError);
        assert!(folded.description.is_none());
    }

    #[test]
    fn test_bearer_params_are_sorted() {
        let error = BearerError::invalid_token("expired token").with_realm("OAuth2");
        assert_eq!(
            error.params(),
            r#"error="invalid_token", error_description="expired token", realm="OAuth2""#
        );

        let error = BearerError::insufficient_scope("foo bar");
        assert_eq!(error.status, 403);
        assert_eq!(error.params(), r#"error="insufficient_scope", scope="foo bar""#);
    }

    #[test]
    fn test_protected_resource_has_no_params() {
        let error = BearerError::protected_resource();
        assert_eq!(error.status, 401);
        assert!(error.params().is_empty());
    }
}
