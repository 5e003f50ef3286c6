//! Token Codec
//!
//! Signed opaque tokens. A token is a random key plus its HMAC-SHA256
//! signature under the server secret, rendered as
//! `base64url(key).base64url(signature)`. The signature string doubles as
//! the credential store lookup key, so the raw token is never persisted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;

use crate::error::{CodecError, ConfigurationError};

/// Server secret used to sign and verify tokens.
#[derive(Clone)]
pub struct ServerSecret {
    key: hmac::Key,
}

impl ServerSecret {
    /// Create a secret from raw bytes.
    pub fn new(bytes: &[u8]) -> Result<Self, ConfigurationError> {
        if bytes.is_empty() {
            return Err(ConfigurationError::MissingRequired {
                field: "secret".to_string(),
            });
        }

        Ok(Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, bytes),
        })
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        hmac::sign(&self.key, data).as_ref().to_vec()
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        hmac::verify(&self.key, data, signature).is_ok()
    }
}

impl fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSecret([REDACTED])")
    }
}

/// A signed opaque token.
#[derive(Clone, PartialEq, Eq)]
pub struct OpaqueToken {
    key: Vec<u8>,
    signature: Vec<u8>,
}

impl OpaqueToken {
    /// Generate a fresh token with `key_length` random bytes.
    pub fn generate(secret: &ServerSecret, key_length: usize) -> Result<Self, CodecError> {
        let mut key = vec![0u8; key_length];
        SystemRandom::new()
            .fill(&mut key)
            .map_err(|_| CodecError::Entropy)?;

        let signature = secret.sign(&key);
        Ok(Self { key, signature })
    }

    /// Parse and verify a token string.
    pub fn parse(secret: &ServerSecret, text: &str) -> Result<Self, CodecError> {
        let (key, signature) = text.split_once('.').ok_or(CodecError::Malformed)?;
        if key.is_empty() || signature.is_empty() {
            return Err(CodecError::Malformed);
        }

        let key = URL_SAFE_NO_PAD
            .decode(key)
            .map_err(|_| CodecError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CodecError::Malformed)?;

        if !secret.verify(&key, &signature) {
            return Err(CodecError::Malformed);
        }

        Ok(Self { key, signature })
    }

    /// Encoded signature, used as the storage key.
    pub fn signature(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.signature)
    }
}

impl fmt::Display for OpaqueToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&self.key),
            URL_SAFE_NO_PAD.encode(&self.signature)
        )
    }
}

impl fmt::Debug for OpaqueToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueToken")
            .field("key", &"[REDACTED]")
            .field("signature", &self.signature())
            .finish()
    }
}

/// Token codec bound to a server secret and key length.
#[derive(Clone, Debug)]
pub struct TokenCodec {
    secret: ServerSecret,
    key_length: usize,
}

impl TokenCodec {
    pub fn new(secret: ServerSecret, key_length: usize) -> Self {
        Self { secret, key_length }
    }

    /// Generate a new token.
    pub fn generate(&self) -> Result<OpaqueToken, CodecError> {
        OpaqueToken::generate(&self.secret, self.key_length)
    }

    /// Parse and verify a token string.
    pub fn parse(&self, text: &str) -> Result<OpaqueToken, CodecError> {
        OpaqueToken::parse(&self.secret, text)
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }
}
