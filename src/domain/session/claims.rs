//! Access token claims

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::TokenError;
use crate::domain::user::{UserId, UserIdentity, UserRole};

/// Claims carried by a signed access token
///
/// Field order is the serialization order, so a given identity and issue
/// time always produce the same claims segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (decimal user ID)
    pub sub: String,
    /// User email at issue time
    pub email: String,
    /// User role at issue time
    pub role: UserRole,
    /// Issued at timestamp (Unix epoch seconds)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,
}

impl AccessClaims {
    /// Create new claims for a user, valid for `lifetime` from `now`
    pub fn new(user: &UserIdentity, now: DateTime<Utc>, lifetime: Duration) -> Self {
        let iat = now.timestamp();

        Self {
            sub: user.id().to_string(),
            email: user.email().to_string(),
            role: user.role(),
            iat,
            exp: iat + lifetime.num_seconds(),
        }
    }

    /// Check if the claims have expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Parse the subject back into a user ID
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        let raw: i64 = self
            .sub
            .parse()
            .map_err(|_| TokenError::malformed(format!("subject '{}' is not numeric", self.sub)))?;

        UserId::new(raw).map_err(|e| TokenError::malformed(e.to_string()))
    }

    /// Rebuild the identity projection the token was issued for
    pub fn identity(&self) -> Result<UserIdentity, TokenError> {
        UserIdentity::new(self.user_id()?, self.email.clone(), self.role)
            .map_err(|e| TokenError::malformed(e.to_string()))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identity() -> UserIdentity {
        UserIdentity::new(UserId::new(1).unwrap(), "test@example.com", UserRole::Student).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_claims_from_identity() {
        let claims = AccessClaims::new(&identity(), t0(), Duration::hours(1));

        assert_eq!(claims.sub, "1");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, UserRole::Student);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.expires_at(), Some(t0() + Duration::hours(1)));
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = AccessClaims::new(&identity(), t0(), Duration::seconds(60));

        assert!(!claims.is_expired_at(t0()));
        assert!(!claims.is_expired_at(t0() + Duration::seconds(59)));
        assert!(claims.is_expired_at(t0() + Duration::seconds(60)));
    }

    #[test]
    fn test_identity_round_trip() {
        let claims = AccessClaims::new(&identity(), t0(), Duration::hours(1));
        assert_eq!(claims.identity().unwrap(), identity());
    }

    #[test]
    fn test_non_numeric_subject() {
        let mut claims = AccessClaims::new(&identity(), t0(), Duration::hours(1));
        claims.sub = "admin".to_string();

        assert!(matches!(
            claims.user_id(),
            Err(TokenError::TokenMalformed { .. })
        ));
    }

    #[test]
    fn test_role_serialized_as_tag() {
        let claims = AccessClaims::new(&identity(), t0(), Duration::hours(1));
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["role"], "STUDENT");
        assert_eq!(json["sub"], "1");
    }
}
