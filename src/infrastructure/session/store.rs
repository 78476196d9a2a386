//! Refresh token store
//!
//! Owns creation and revocation of refresh token records on top of a
//! [`RefreshTokenRepository`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error};

use super::generator::RefreshTokenGenerator;
use crate::config::AuthConfig;
use crate::domain::session::{RefreshToken, RefreshTokenRepository, RevokeOutcome, TokenError};
use crate::domain::user::{UserId, UserIdentity};
use crate::domain::DomainError;

/// Device and origin descriptors recorded with a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}

impl ClientInfo {
    pub fn new(device_info: Option<String>, ip_address: Option<String>) -> Self {
        Self {
            device_info,
            ip_address,
        }
    }

    /// The descriptors a token was created with, reused on rotation
    pub fn of(token: &RefreshToken) -> Self {
        Self {
            device_info: token.device_info().map(str::to_string),
            ip_address: token.ip_address().map(str::to_string),
        }
    }
}

/// Store for persisted refresh tokens
#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
    generator: RefreshTokenGenerator,
    lifetime: Duration,
}

impl std::fmt::Debug for RefreshTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenStore")
            .field("generator", &self.generator)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl RefreshTokenStore {
    /// Create a new store issuing tokens valid for `lifetime`
    pub fn new(repository: Arc<dyn RefreshTokenRepository>, lifetime: Duration) -> Self {
        Self {
            repository,
            generator: RefreshTokenGenerator::new(),
            lifetime,
        }
    }

    /// Create a store using the refresh lifetime from auth configuration
    pub fn from_config(
        repository: Arc<dyn RefreshTokenRepository>,
        config: &AuthConfig,
    ) -> Result<Self, TokenError> {
        Ok(Self::new(repository, Self::lifetime_from_config(config)?))
    }

    /// Refresh token lifetime from configuration, rejecting zero and unrepresentable values
    pub fn lifetime_from_config(config: &AuthConfig) -> Result<Duration, TokenError> {
        let days = config.refresh_token_lifetime_days;

        i64::try_from(days)
            .ok()
            .filter(|d| *d > 0)
            .and_then(Duration::try_days)
            .ok_or_else(|| {
                TokenError::configuration(format!(
                    "refresh_token_lifetime_days must be a positive number of days, got {}",
                    days
                ))
            })
    }

    pub fn with_generator(mut self, generator: RefreshTokenGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Create and persist a fresh refresh token for `user`
    ///
    /// A token collision is an implementation fault at this entropy level,
    /// so it surfaces as an internal error and is never retried.
    pub async fn create(
        &self,
        user: &UserIdentity,
        client: ClientInfo,
        now: DateTime<Utc>,
    ) -> Result<RefreshToken, TokenError> {
        let expires_at = now.checked_add_signed(self.lifetime).ok_or_else(|| {
            TokenError::configuration("Refresh token expiry is outside the supported date range")
        })?;

        let token = RefreshToken::new(
            self.generator.generate(),
            user.id(),
            expires_at,
            client.device_info,
            client.ip_address,
            now,
        );

        let token = self.repository.insert(token).await.map_err(|e| {
            if e.is_conflict() {
                error!(user_id = %user.id(), "Generated refresh token collided with a stored token");
                DomainError::internal("Refresh token collision")
            } else {
                e
            }
        })?;

        debug!(user_id = %user.id(), id = %token.id(), "Created refresh token");

        Ok(token)
    }

    /// Exact-match lookup
    pub async fn find_by_token(&self, token: &str) -> Result<RefreshToken, TokenError> {
        self.repository
            .find_by_token(token)
            .await?
            .ok_or(TokenError::NotFound)
    }

    /// Revoke a token. Revoking an already revoked token succeeds.
    pub async fn revoke(&self, token: &str, now: DateTime<Utc>) -> Result<(), TokenError> {
        match self.repository.revoke_if_active(token, now).await? {
            RevokeOutcome::Revoked(_) | RevokeOutcome::AlreadyRevoked => Ok(()),
            RevokeOutcome::NotFound => Err(TokenError::NotFound),
        }
    }

    /// Conditionally revoke, reporting whether this call won the transition
    pub async fn revoke_if_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, TokenError> {
        Ok(self.repository.revoke_if_active(token, now).await?)
    }

    /// Revoke every active token of a user, returning how many were revoked
    pub async fn revoke_all_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, TokenError> {
        Ok(self.repository.revoke_all_for_user(user_id, now).await?)
    }

    /// Tokens of a user still usable at `now`, newest first
    pub async fn list_active_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshToken>, TokenError> {
        let tokens = self.repository.list_for_user(user_id).await?;
        Ok(tokens.into_iter().filter(|t| t.is_usable(now)).collect())
    }

    /// Pure usability predicate
    pub fn is_usable(token: &RefreshToken, now: DateTime<Utc>) -> bool {
        token.is_usable(now)
    }
}
