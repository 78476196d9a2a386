//! Refresh token repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::refresh_token::RefreshToken;
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Result of a conditional revocation
#[derive(Debug, Clone)]
pub enum RevokeOutcome {
    /// This call flipped `revoked` from false to true
    Revoked(RefreshToken),
    /// The token exists but another caller revoked it first
    AlreadyRevoked,
    /// No token with that string was ever stored
    NotFound,
}

/// Persistence for refresh tokens, keyed by the opaque token string
///
/// `revoke_if_active` must be a single atomic check-and-set on
/// `revoked == false`: of any number of concurrent calls for the same
/// token, exactly one observes `Revoked`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Persist a new token. Fails with `Conflict` if the token string exists.
    async fn insert(&self, token: RefreshToken) -> Result<RefreshToken, DomainError>;

    /// Exact-match lookup by token string
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, DomainError>;

    /// Atomically revoke a token that is not yet revoked
    async fn revoke_if_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, DomainError>;

    /// Revoke every non-revoked token owned by the user, returning how many changed
    async fn revoke_all_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError>;

    /// All tokens owned by the user, newest first
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<RefreshToken>, DomainError>;
}
