//! Core Components
//!
//! Token codec, request/response model and response writers.

pub mod codec;
pub mod response;
pub mod transport;

pub use codec::{OpaqueToken, ServerSecret, TokenCodec};
pub use response::{
    write_bearer_error, write_code_response, write_error, write_json, write_redirect,
    write_redirect_error, write_text, write_token_response,
};
pub use transport::{HttpMethod, HttpRequest, HttpResponse};
