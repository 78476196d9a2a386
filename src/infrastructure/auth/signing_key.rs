//! Symmetric signing key provider

use std::fmt::Debug;

use crate::config::AuthConfig;
use crate::domain::TokenError;

/// Absolute floor for HMAC-SHA256 key material (256 bits)
pub const MIN_SECRET_BYTES: usize = 32;

/// Validated secret used to sign and verify access tokens
///
/// Built once at startup and shared read-only behind an `Arc`.
#[derive(Clone)]
pub struct SigningKey {
    secret: Vec<u8>,
}

impl Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("secret", &"[hidden]")
            .field("len", &self.secret.len())
            .finish()
    }
}

impl SigningKey {
    /// Validate the secret against `minimum_length`, itself floored at 32 bytes
    pub fn new(secret: impl Into<Vec<u8>>, minimum_length: usize) -> Result<Self, TokenError> {
        let secret = secret.into();
        let required = minimum_length.max(MIN_SECRET_BYTES);

        if secret.len() < required {
            return Err(TokenError::configuration(format!(
                "Signing secret must be at least {} bytes, got {}",
                required,
                secret.len()
            )));
        }

        Ok(Self { secret })
    }

    /// Build the key from the auth section of the application config
    pub fn from_config(config: &AuthConfig) -> Result<Self, TokenError> {
        Self::new(
            config.signing_secret.as_bytes().to_vec(),
            config.minimum_secret_length,
        )
    }

    pub fn key_material(&self) -> &[u8] {
        &self.secret
    }
}
