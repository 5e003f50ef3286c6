//! Token Management
//!
//! Credential lifecycle after issuance.
//!
//! This module provides:
//!
//! - **Credential Storage**: Store trait with in-memory and mock implementations
//! - **Token Revocation**: RFC 7009 token revocation
//! - **Token Introspection**: RFC 7662 token introspection
//! - **Expiry Sweep**: Periodic removal of expired credentials

pub mod introspection;
pub mod revocation;
pub mod storage;
pub mod sweep;

// Credential Storage
pub use storage::{
    create_in_memory_credential_store, create_mock_credential_store, CredentialStore,
    InMemoryCredentialStore, MarkUsed, MockCredentialStore,
};

// Token Introspection
pub use introspection::TokenIntrospector;

// Token Revocation
pub use revocation::TokenRevoker;

// Expiry Sweep
pub use sweep::{spawn_expiry_sweep, DEFAULT_SWEEP_INTERVAL};
