//! Response Writers
//!
//! Rendering of token responses, codes and protocol errors as
//! [`HttpResponse`]s, either directly as JSON or through a redirect.

use serde::Serialize;
use tracing::error;
use url::form_urlencoded;
use url::Url;

use crate::core::transport::HttpResponse;
use crate::error::{BearerError, ErrorCode, OAuth2Error};
use crate::types::{CodeResponse, TokenResponse};

/// Write a JSON document with the no-store cache headers.
pub fn write_json<T: Serialize>(status: u16, document: &T) -> HttpResponse {
    match serde_json::to_string(document) {
        Ok(body) => HttpResponse::new(status)
            .with_header("Content-Type", "application/json;charset=UTF-8")
            .with_header("Cache-Control", "no-store")
            .with_header("Pragma", "no-cache")
            .with_body(body),
        Err(e) => {
            error!(error = %e, "failed to encode response document");
            HttpResponse::new(500)
        }
    }
}

/// Write a plain text response.
pub fn write_text(status: u16, text: &str) -> HttpResponse {
    HttpResponse::new(status)
        .with_header("Content-Type", "text/plain;charset=UTF-8")
        .with_body(text)
}

/// Write a redirect carrying `params` in the query or the fragment of
/// `uri`. Existing query parameters are kept.
pub fn write_redirect(
    uri: &str,
    params: &[(&str, String)],
    use_fragment: bool,
) -> Result<HttpResponse, url::ParseError> {
    let mut location = Url::parse(uri)?;

    if use_fragment {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            serializer.append_pair(key, value);
        }
        location.set_fragment(Some(&serializer.finish()));
    } else {
        let mut pairs = location.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }

    Ok(HttpResponse::new(302).with_header("Location", location.as_str()))
}

/// Write an error directly as a JSON document.
pub fn write_error(error: &OAuth2Error, realm: &str) -> HttpResponse {
    let response = write_json(error.status(), error);
    if error.code == ErrorCode::InvalidClient {
        response.with_header("WWW-Authenticate", format!(r#"Basic realm="{}""#, realm))
    } else {
        response
    }
}

/// Write an error through a redirect. Falls back to direct delivery of a
/// `server_error` when the redirect URI cannot be parsed.
pub fn write_redirect_error(
    uri: &str,
    use_fragment: bool,
    error: &OAuth2Error,
    realm: &str,
) -> HttpResponse {
    match write_redirect(uri, &error.params(), use_fragment) {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "registered redirect uri is invalid");
            write_error(&OAuth2Error::from_code(ErrorCode::ServerError), realm)
        }
    }
}

/// Write a token response, as JSON or through its redirect target.
pub fn write_token_response(response: &TokenResponse, realm: &str) -> HttpResponse {
    match &response.redirect {
        Some(target) => match write_redirect(&target.uri, &response.params(), target.use_fragment) {
            Ok(redirect) => redirect,
            Err(e) => {
                error!(error = %e, "registered redirect uri is invalid");
                write_error(&OAuth2Error::from_code(ErrorCode::ServerError), realm)
            }
        },
        None => write_json(200, response),
    }
}

/// Write an authorization code redirect.
pub fn write_code_response(uri: &str, response: &CodeResponse, realm: &str) -> HttpResponse {
    match write_redirect(uri, &response.params(), false) {
        Ok(redirect) => redirect,
        Err(e) => {
            error!(error = %e, "registered redirect uri is invalid");
            write_error(&OAuth2Error::from_code(ErrorCode::ServerError), realm)
        }
    }
}

/// Write a bearer authentication failure. Internal failures are rendered as
/// a bare `500` without a challenge.
pub fn write_bearer_error(error: &BearerError, default_realm: &str) -> HttpResponse {
    if error.status == 500 {
        return HttpResponse::new(500);
    }

    let mut error = error.clone();
    if error.realm.is_none() && error.code.is_none() {
        error.realm = Some(default_realm.to_string());
    }

    let params = error.params();
    let challenge = if params.is_empty() {
        format!(r#"Bearer realm="{}""#, default_realm)
    } else {
        format!("Bearer {}", params)
    };

    HttpResponse::new(error.status).with_header("WWW-Authenticate", challenge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScopeSet;

    #[test]
    fn test_write_error() {
        let response = write_error(&OAuth2Error::invalid_request("foo"), "OAuth2");
        assert_eq!(response.status, 400);
        assert_eq!(response.header("Content-Type"), Some("application/json;charset=UTF-8"));
        assert_eq!(response.header("Cache-Control"), Some("no-store"));
        assert_eq!(response.header("Pragma"), Some("no-cache"));
        assert!(response.header("WWW-Authenticate").is_none());
        assert_eq!(
            response.json::<serde_json::Value>().unwrap(),
            serde_json::json!({ "error": "invalid_request", "error_description": "foo" })
        );
    }

    #[test]
    fn test_write_error_invalid_client_challenge() {
        let response = write_error(&OAuth2Error::invalid_client("foo"), "OAuth2");
        assert_eq!(response.status, 401);
        assert_eq!(response.header("WWW-Authenticate"), Some(r#"Basic realm="OAuth2""#));
    }

    #[test]
    fn test_write_redirect_error_query() {
        let error = OAuth2Error::invalid_request("foo").with_state(Some("bar"));
        let response =
            write_redirect_error("http://example.com?baz=qux", false, &error, "OAuth2");

        assert_eq!(response.status, 302);
        let location = Url::parse(response.location().unwrap()).unwrap();
        let pairs: Vec<(String, String)> = location.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("baz".to_string(), "qux".to_string()),
                ("error".to_string(), "invalid_request".to_string()),
                ("error_description".to_string(), "foo".to_string()),
                ("state".to_string(), "bar".to_string()),
            ]
        );
        assert!(location.fragment().is_none());
    }

    #[test]
    fn test_write_redirect_error_fragment() {
        let error = OAuth2Error::access_denied("").with_state(Some("xyz"));
        let response = write_redirect_error("http://example.com/cb", true, &error, "OAuth2");

        let location = Url::parse(response.location().unwrap()).unwrap();
        assert_eq!(location.fragment(), Some("error=access_denied&state=xyz"));
        assert!(location.query().is_none());
    }

    #[test]
    fn test_write_redirect_error_with_invalid_uri() {
        let error = OAuth2Error::access_denied("");
        let response = write_redirect_error("not a uri", true, &error, "OAuth2");
        assert_eq!(response.status, 500);
        assert!(response.body.contains("server_error"));
    }

    #[test]
    fn test_write_token_response_json() {
        let token = TokenResponse::bearer("foo", 3600).with_scope(ScopeSet::parse("bar"));
        let response = write_token_response(&token, "OAuth2");
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Cache-Control"), Some("no-store"));

        let json: serde_json::Value = response.json().unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["access_token"], "foo");
        assert_eq!(json["expires_in"], 3600);
        assert_eq!(json["scope"], "bar");
    }

    #[test]
    fn test_write_token_response_redirect() {
        let token = TokenResponse::bearer("foo", 60)
            .with_state(Some("xyz"))
            .with_redirect("http://example.com/cb", true);
        let response = write_token_response(&token, "OAuth2");

        assert_eq!(response.status, 302);
        let location = Url::parse(response.location().unwrap()).unwrap();
        assert_eq!(
            location.fragment(),
            Some("token_type=bearer&access_token=foo&expires_in=60&state=xyz")
        );
    }

    #[test]
    fn test_write_bearer_error() {
        let response = write_bearer_error(&BearerError::protected_resource(), "OAuth2");
        assert_eq!(response.status, 401);
        assert_eq!(response.header("WWW-Authenticate"), Some(r#"Bearer realm="OAuth2""#));

        let response = write_bearer_error(&BearerError::invalid_token("foo"), "OAuth2");
        assert_eq!(response.status, 401);
        assert_eq!(
            response.header("WWW-Authenticate"),
            Some(r#"Bearer error="invalid_token", error_description="foo""#)
        );

        let response = write_bearer_error(&BearerError::server_error(), "OAuth2");
        assert_eq!(response.status, 500);
        assert!(response.headers.is_empty());
        assert!(response.body.is_empty());
    }
}
