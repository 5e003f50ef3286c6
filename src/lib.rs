//! OAuth2 Authorization Server
//!
//! Embeddable OAuth 2.0 authorization server engine: it issues, validates and
//! revokes opaque signed tokens for registered clients and resource owners.
//!
//! # Features
//!
//! - Implicit Grant (RFC 6749 Section 4.2)
//! - Authorization Code Grant (RFC 6749 Section 4.1) with replay detection
//! - Resource Owner Password Credentials Grant (RFC 6749 Section 4.3)
//! - Client Credentials Grant (RFC 6749 Section 4.4)
//! - Refresh Token rotation (RFC 6749 Section 6)
//! - Bearer Token validation (RFC 6750)
//! - Token Revocation (RFC 7009)
//! - Token Introspection (RFC 7662)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oauth2_server::{
//!     authorization_server, server_config, Client, HttpRequest, InMemoryCredentialStore,
//!     InMemoryRegistry,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = server_config()
//!         .secret("a-very-long-secret")
//!         .allowed_scope("foo bar")
//!         .build()?;
//!
//!     let registry = InMemoryRegistry::new();
//!     registry.add_client(Client::confidential("client1", "foo", "https://app.example/cb"))?;
//!
//!     let server = authorization_server(
//!         config,
//!         Arc::new(registry),
//!         Arc::new(InMemoryCredentialStore::new()),
//!     );
//!
//!     let response = server
//!         .token(
//!             &HttpRequest::post()
//!                 .basic_auth("client1", "foo")
//!                 .form_param("grant_type", "client_credentials")
//!                 .form_param("scope", "foo"),
//!         )
//!         .await;
//!
//!     println!("{} {}", response.status, response.body);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: request, credential and configuration types
//! - `error`: protocol and internal error hierarchy
//! - `core`: token codec, HTTP request/response model and response writers
//! - `registry`: client and resource owner lookup
//! - `flows`: the grant engine and its grant handlers
//! - `token`: credential storage, revocation, introspection and expiry sweep
//! - `bearer`: protected resource token validation
//! - `builders`: fluent builder for configuration
//! - `server`: HTTP-level facade combining all endpoints

pub mod bearer;
pub mod builders;
pub mod core;
pub mod error;
pub mod flows;
pub mod registry;
pub mod server;
pub mod telemetry;
pub mod token;
pub mod types;

// Re-export main server
pub use server::{authorization_server, AuthorizationServer};

// Re-export builders
pub use builders::{server_config, ServerConfigBuilder};

// Re-export errors
pub use error::{
    BearerError, BearerErrorCode, CodecError, ConfigurationError, EngineError, EngineResult,
    ErrorCode, OAuth2Error, RegistryError, StorageError,
};

// Re-export types
pub use types::{
    // Config
    LifespanSettings, ServerConfig,
    // Scope
    ScopeSet,
    // Clients
    Client, ClientCredentials, ResourceOwner,
    // Requests
    AuthorizationRequest, GrantType, IntrospectionRequest, ResponseType, RevocationRequest,
    TokenLookupRequest, TokenRequest, TokenTypeHint,
    // Credentials and responses
    CodeResponse, Credential, CredentialKind, IntrospectionResponse, TokenResponse,
};

// Re-export core components
pub use crate::core::{HttpMethod, HttpRequest, HttpResponse, OpaqueToken, ServerSecret, TokenCodec};

// Re-export registry
pub use registry::{ClientRegistry, InMemoryRegistry, PlainSecretVerifier, SecretVerifier};

// Re-export flows
pub use flows::{
    AuthorizationFailure, AuthorizationOutcome, GrantEngine, IssuePolicy,
    AUTHORIZATION_FORM_NOTICE,
};

// Re-export token management
pub use token::{
    // Storage
    create_in_memory_credential_store, create_mock_credential_store, CredentialStore,
    InMemoryCredentialStore, MarkUsed, MockCredentialStore,
    // Introspection
    TokenIntrospector,
    // Revocation
    TokenRevoker,
    // Sweep
    spawn_expiry_sweep, DEFAULT_SWEEP_INTERVAL,
};

// Re-export bearer validation
pub use bearer::{extract_token, BearerValidator};

// Re-export telemetry
pub use telemetry::{
    create_in_memory_metrics, no_op_metrics, InMemoryMetrics, MetricEntry, MetricLabels,
    NoOpMetrics, ServerMetrics,
};
