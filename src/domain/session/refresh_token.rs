//! Refresh token entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;

/// Refresh token record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshTokenId(Uuid);

impl RefreshTokenId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RefreshTokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RefreshTokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a refresh token at a point in time
///
/// `Expired` is never stored; it is derived from `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTokenState {
    Active,
    Revoked,
    Expired,
}

/// Long-lived, revocable credential used to mint new access tokens
#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    id: RefreshTokenId,
    /// Opaque random string presented by the client
    token: String,
    user_id: UserId,
    expires_at: DateTime<Utc>,
    revoked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    revoked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshToken")
            .field("id", &self.id)
            .field("token", &"[hidden]")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .field("revoked", &self.revoked)
            .field("revoked_at", &self.revoked_at)
            .field("device_info", &self.device_info)
            .field("ip_address", &self.ip_address)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl RefreshToken {
    /// Create a new, active refresh token
    pub fn new(
        token: impl Into<String>,
        user_id: UserId,
        expires_at: DateTime<Utc>,
        device_info: Option<String>,
        ip_address: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RefreshTokenId::new(),
            token: token.into(),
            user_id,
            expires_at,
            revoked: false,
            revoked_at: None,
            device_info,
            ip_address,
            created_at,
        }
    }

    /// Rebuild a token from persisted columns
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: RefreshTokenId,
        token: String,
        user_id: UserId,
        expires_at: DateTime<Utc>,
        revoked: bool,
        revoked_at: Option<DateTime<Utc>>,
        device_info: Option<String>,
        ip_address: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            token,
            user_id,
            expires_at,
            revoked,
            revoked_at,
            device_info,
            ip_address,
            created_at,
        }
    }

    // Getters

    pub fn id(&self) -> RefreshTokenId {
        self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at
    }

    pub fn device_info(&self) -> Option<&str> {
        self.device_info.as_deref()
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // Status checks

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A token is usable for renewal iff it is not revoked and not expired
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }

    /// Revocation wins over expiry so a revoked token never reads as merely expired
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked {
            RefreshTokenState::Revoked
        } else if self.is_expired_at(now) {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }

    // Mutators

    /// Mark the token revoked. Returns false if it already was.
    pub fn revoke(&mut self, now: DateTime<Utc>) -> bool {
        if self.revoked {
            return false;
        }

        self.revoked = true;
        self.revoked_at = Some(now);
        true
    }
}
