//! Builders
//!
//! Fluent builder patterns for server configuration.

pub mod config;

pub use config::{server_config, ServerConfigBuilder};
