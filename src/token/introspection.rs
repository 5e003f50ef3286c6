//! Token Introspection
//!
//! RFC 7662 - OAuth 2.0 Token Introspection.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{EngineResult, OAuth2Error};
use crate::flows::GrantEngine;
use crate::types::{IntrospectionRequest, IntrospectionResponse, TokenTypeHint};

/// Token introspector interface.
#[async_trait]
pub trait TokenIntrospector: Send + Sync {
    /// Describe a token. Unknown, expired or foreign tokens are inactive.
    async fn introspect(&self, request: IntrospectionRequest) -> EngineResult<IntrospectionResponse>;
}

#[async_trait]
impl TokenIntrospector for GrantEngine {
    #[instrument(skip(self, request), fields(client_id = %request.client.client_id))]
    async fn introspect(&self, request: IntrospectionRequest) -> EngineResult<IntrospectionResponse> {
        let result = self.introspect_token(&request).await;
        match &result {
            Ok(response) => self.metrics.record_token_introspection(response.active),
            Err(e) => {
                debug!(error = e.error_code(), "introspection rejected");
                self.metrics.record_error("introspect", e.error_code());
            }
        }
        result
    }
}

impl GrantEngine {
    async fn introspect_token(
        &self,
        request: &IntrospectionRequest,
    ) -> EngineResult<IntrospectionResponse> {
        let client = self.authenticate_client(&request.client).await?;

        let token = self
            .codec
            .parse(&request.token)
            .map_err(|_| OAuth2Error::invalid_request("a valid token must be provided"))?;
        let signature = token.signature();

        for kind in TokenTypeHint::search_order(request.token_type_hint) {
            let Some(credential) = self.store.get(kind, &signature).await? else {
                continue;
            };

            if credential.client_id != client.id {
                return Err(OAuth2Error::invalid_client("wrong client").into());
            }

            if credential.is_expired() {
                return Ok(IntrospectionResponse::inactive());
            }

            return Ok(IntrospectionResponse {
                active: true,
                scope: Some(credential.scope.to_string()).filter(|s| !s.is_empty()),
                client_id: Some(credential.client_id),
                username: credential.resource_owner_id,
                token_type: Some(kind.as_str().to_string()),
                exp: Some(credential.expires_at.timestamp()),
            });
        }

        Ok(IntrospectionResponse::inactive())
    }
}
