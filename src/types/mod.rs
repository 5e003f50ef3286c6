//! OAuth2 Types
//!
//! Core type definitions for the authorization server.

pub mod auth;
pub mod client;
pub mod config;
pub mod grant;
pub mod introspection;
pub mod scope;
pub mod token;

pub use auth::*;
pub use client::*;
pub use config::*;
pub use grant::*;
pub use introspection::*;
pub use scope::*;
pub use token::*;
