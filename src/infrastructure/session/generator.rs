//! Refresh token string generation
//!
//! Generates opaque, URL-safe tokens from the operating system's CSPRNG.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

/// Minimum entropy accepted for a refresh token (128 bits)
pub const MIN_TOKEN_BYTES: usize = 16;

/// Generator for opaque refresh token strings
#[derive(Debug, Clone)]
pub struct RefreshTokenGenerator {
    /// Number of random bytes per token
    token_bytes: usize,
}

impl Default for RefreshTokenGenerator {
    fn default() -> Self {
        Self { token_bytes: 32 }
    }
}

impl RefreshTokenGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of random bytes, never below [`MIN_TOKEN_BYTES`]
    pub fn with_token_bytes(mut self, bytes: usize) -> Self {
        self.token_bytes = bytes.max(MIN_TOKEN_BYTES);
        self
    }

    pub fn token_bytes(&self) -> usize {
        self.token_bytes
    }

    /// Generate a new token string
    pub fn generate(&self) -> String {
        let mut random_bytes = vec![0u8; self.token_bytes];
        OsRng.fill_bytes(&mut random_bytes);

        URL_SAFE_NO_PAD.encode(&random_bytes)
    }
}
