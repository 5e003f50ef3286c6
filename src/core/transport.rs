//! HTTP Transport
//!
//! Framework neutral request and response model. Hosts translate their
//! HTTP server types into [`HttpRequest`] and write back the returned
//! [`HttpResponse`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use url::form_urlencoded;

/// HTTP method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Parse a method name (case insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Incoming HTTP request.
#[derive(Clone, Debug, Default)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request headers, keyed by lowercase name.
    pub headers: HashMap<String, String>,
    /// Decoded query parameters.
    pub query: HashMap<String, String>,
    /// Decoded `application/x-www-form-urlencoded` body parameters.
    pub form: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    pub fn post() -> Self {
        Self::new(HttpMethod::Post)
    }

    /// Add a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Add a query parameter.
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Add a form parameter.
    pub fn form_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    /// Add every parameter of an encoded query string.
    pub fn query_string(mut self, encoded: &str) -> Self {
        self.query.extend(decode_pairs(encoded));
        self
    }

    /// Add every parameter of an encoded form body.
    pub fn form_body(mut self, encoded: &str) -> Self {
        self.form.extend(decode_pairs(encoded));
        self
    }

    /// Set HTTP Basic credentials.
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{}:{}", username, password));
        self.header("authorization", format!("Basic {}", encoded))
    }

    /// Set a bearer token header.
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("authorization", format!("Bearer {}", token))
    }

    /// Get a header by name (case insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get a parameter, preferring the form body over the query.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.form
            .get(name)
            .or_else(|| self.query.get(name))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Decode HTTP Basic credentials, if present and well formed.
    pub fn basic_credentials(&self) -> Option<(String, String)> {
        let value = self.get_header("authorization")?;
        let (scheme, encoded) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some((username.to_string(), password.to_string()))
    }
}

fn decode_pairs(encoded: &str) -> impl Iterator<Item = (String, String)> + '_ {
    form_urlencoded::parse(encoded.trim_start_matches('?').as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
}

/// Outgoing HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, keyed by canonical name.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Get a header by name (case insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Redirect location.
    pub fn location(&self) -> Option<&str> {
        self.header("Location")
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
        assert_eq!(HttpMethod::parse("post"), Some(HttpMethod::Post));
        assert_eq!(HttpMethod::parse("PATCH"), None);
    }

    #[test]
    fn test_params_prefer_form() {
        let request = HttpRequest::post()
            .query_param("scope", "foo")
            .form_param("scope", "bar")
            .query_param("state", "xyz")
            .form_param("empty", "");

        assert_eq!(request.param("scope"), Some("bar"));
        assert_eq!(request.param("state"), Some("xyz"));
        assert_eq!(request.param("empty"), None);
        assert_eq!(request.param("missing"), None);
    }

    #[test]
    fn test_encoded_parameters() {
        let request = HttpRequest::post()
            .query_string("?a=1&b=hello%20world")
            .form_body("grant_type=password&scope=foo+bar");

        assert_eq!(request.query.get("b").map(String::as_str), Some("hello world"));
        assert_eq!(request.param("scope"), Some("foo bar"));
        assert_eq!(request.param("grant_type"), Some("password"));
    }

    #[test]
    fn test_basic_credentials() {
        let request = HttpRequest::post().basic_auth("client1", "foo:bar");
        assert_eq!(
            request.basic_credentials(),
            Some(("client1".to_string(), "foo:bar".to_string()))
        );

        let request = HttpRequest::post().header("Authorization", "Basic !!!");
        assert_eq!(request.basic_credentials(), None);

        let request = HttpRequest::post().bearer_auth("token");
        assert_eq!(request.basic_credentials(), None);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest::get().header("X-Custom", "1");
        assert_eq!(request.get_header("x-custom"), Some("1"));

        let response = HttpResponse::new(302).with_header("Location", "http://example.com");
        assert_eq!(response.location(), Some("http://example.com"));
        assert!(response.is_redirect());
    }
}
