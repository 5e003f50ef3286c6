//! Bearer Validation
//!
//! RFC 6750 - Bearer Token Usage. Extracts the bearer token of a protected
//! resource request and checks it against the credential store.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::codec::TokenCodec;
use crate::core::transport::{HttpMethod, HttpRequest};
use crate::error::BearerError;
use crate::telemetry::{NoOpMetrics, ServerMetrics};
use crate::token::storage::CredentialStore;
use crate::types::{Credential, CredentialKind, ScopeSet};

const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Extract the bearer token of a request.
///
/// The token may travel in the `Authorization` header, the `access_token`
/// form field of a POST or the `access_token` query parameter. Using more
/// than one of these is an error.
pub fn extract_token(request: &HttpRequest) -> Result<String, BearerError> {
    let mut sources = Vec::with_capacity(3);

    if let Some(header) = request.get_header("authorization") {
        if let Some((scheme, token)) = header.split_once(' ') {
            if scheme.eq_ignore_ascii_case("bearer") {
                let token = token.trim();
                if token.is_empty() {
                    return Err(BearerError::invalid_request("malformed authorization header"));
                }
                sources.push(token.to_string());
            }
        }
    }

    if request.method == HttpMethod::Post {
        if let Some(token) = request.form.get(ACCESS_TOKEN_PARAM).filter(|t| !t.is_empty()) {
            sources.push(token.clone());
        }
    }

    if let Some(token) = request.query.get(ACCESS_TOKEN_PARAM).filter(|t| !t.is_empty()) {
        sources.push(token.clone());
    }

    match sources.len() {
        0 => Err(BearerError::protected_resource()),
        1 => Ok(sources.remove(0)),
        _ => Err(BearerError::invalid_request("multiple access tokens provided")),
    }
}

/// Bearer token validator.
#[derive(Clone)]
pub struct BearerValidator {
    codec: TokenCodec,
    store: Arc<dyn CredentialStore>,
    metrics: Arc<dyn ServerMetrics>,
}

impl BearerValidator {
    pub fn new(codec: TokenCodec, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            codec,
            store,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn ServerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Validate a token and check that it grants `required` scope.
    pub async fn validate(&self, token: &str, required: &ScopeSet) -> Result<Credential, BearerError> {
        let result = self.check(token, required).await;
        self.metrics.record_bearer_validation(result.is_ok());
        if let Err(e) = &result {
            debug!(error = %e, "bearer token rejected");
        }
        result
    }

    /// Extract and validate the bearer token of a request.
    pub async fn authorize(
        &self,
        request: &HttpRequest,
        required: &ScopeSet,
    ) -> Result<Credential, BearerError> {
        let token = extract_token(request)?;
        self.validate(&token, required).await
    }

    async fn check(&self, token: &str, required: &ScopeSet) -> Result<Credential, BearerError> {
        let signature = self
            .codec
            .parse(token)
            .map_err(|_| BearerError::invalid_token("malformed token"))?
            .signature();

        let credential = match self.store.get(CredentialKind::AccessToken, &signature).await {
            Ok(Some(credential)) => credential,
            Ok(None) => return Err(BearerError::invalid_token("unknown token")),
            Err(e) => {
                warn!(error = %e, "access token lookup failed");
                return Err(BearerError::server_error());
            }
        };

        if credential.is_expired() {
            return Err(BearerError::invalid_token("expired token"));
        }

        if !credential.scope.includes(required) {
            return Err(BearerError::insufficient_scope(required.to_string()));
        }

        Ok(credential)
    }
}
