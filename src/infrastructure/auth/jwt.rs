//! Access token generation and validation

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::signing_key::SigningKey;
use crate::config::AuthConfig;
use crate::domain::user::UserIdentity;
use crate::domain::{AccessClaims, TokenError};

/// Trait for access token operations
pub trait AccessTokenIssuer: Send + Sync + Debug {
    /// Sign a token for `user`, issued at `now`
    fn issue(&self, user: &UserIdentity, now: DateTime<Utc>) -> Result<String, TokenError>;

    /// Verify signature and expiry against the caller-supplied `now`
    ///
    /// No clock-skew allowance is applied. Callers wanting one adjust `now`.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError>;

    /// Lifetime applied to every issued token
    fn lifetime(&self) -> Duration;
}

/// HS256 JWT service backed by a validated [`SigningKey`]
#[derive(Clone)]
pub struct JwtService {
    key: Arc<SigningKey>,
    lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Create a JWT service signing with `key`
    ///
    /// Fails unless `lifetime` is positive, so `exp` is always after `iat`.
    pub fn new(key: Arc<SigningKey>, lifetime: Duration) -> Result<Self, TokenError> {
        if lifetime <= Duration::zero() {
            return Err(TokenError::configuration(format!(
                "Access token lifetime must be positive, got {}s",
                lifetime.num_seconds()
            )));
        }

        let encoding_key = EncodingKey::from_secret(key.key_material());
        let decoding_key = DecodingKey::from_secret(key.key_material());

        // Expiry is checked against the caller's clock, not the system one
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Ok(Self {
            key,
            lifetime,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Build the service from auth configuration, validating the secret
    pub fn from_config(config: &AuthConfig) -> Result<Self, TokenError> {
        let key = Arc::new(SigningKey::from_config(config)?);
        Self::with_key(key, config)
    }

    /// Build the service around an already validated key
    pub fn with_key(key: Arc<SigningKey>, config: &AuthConfig) -> Result<Self, TokenError> {
        Self::new(key, access_token_lifetime(config)?)
    }
}

/// Access token lifetime from configuration, rejecting zero and unrepresentable values
fn access_token_lifetime(config: &AuthConfig) -> Result<Duration, TokenError> {
    let seconds = config.access_token_lifetime_seconds;

    i64::try_from(seconds)
        .ok()
        .filter(|s| *s > 0)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| {
            TokenError::configuration(format!(
                "access_token_lifetime_seconds must be a positive number of seconds, got {}",
                seconds
            ))
        })
}

impl AccessTokenIssuer for JwtService {
    fn issue(&self, user: &UserIdentity, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = AccessClaims::new(user, now, self.lifetime);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::configuration(format!("Failed to sign access token: {}", e)))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError> {
        if token.split('.').count() != 3 {
            return Err(TokenError::malformed(
                "expected three segments: header.claims.signature",
            ));
        }

        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;
        let claims = token_data.claims;

        claims.user_id()?;

        if claims.is_expired_at(now) {
            return Err(TokenError::TokenExpired);
        }

        Ok(claims)
    }

    fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    match error.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
        _ => TokenError::malformed(error.to_string()),
    }
}
