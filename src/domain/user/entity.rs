//! User identity projection consumed by the session kernel

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::{validate_email, validate_user_id, UserValidationError};

/// Numeric user identifier assigned by the account store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Create a new UserId after validation
    pub fn new(id: i64) -> Result<Self, UserValidationError> {
        validate_user_id(id)?;
        Ok(Self(id))
    }

    /// Get the inner numeric value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a user on the learning platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Enrolls in and takes courses
    #[default]
    Student,
    /// Authors and teaches courses
    Instructor,
    /// Platform administrator
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Instructor => "INSTRUCTOR",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Self::Student),
            "INSTRUCTOR" => Ok(Self::Instructor),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(UserValidationError::UnknownRole(s.to_string())),
        }
    }
}

/// Read-only `{id, email, role}` projection of a platform user
///
/// The account store owns the full user record (names, password hash,
/// activation flags). Tokens are only ever minted from this projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    id: UserId,
    email: String,
    role: UserRole,
}

impl UserIdentity {
    /// Create a new identity, validating the email shape
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        role: UserRole,
    ) -> Result<Self, UserValidationError> {
        let email = email.into();
        validate_email(&email)?;

        Ok(Self { id, email, role })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> UserRole {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_valid() {
        let id = UserId::new(42).unwrap();
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_user_id_invalid() {
        assert!(UserId::new(0).is_err());
        assert!(UserId::new(-1).is_err());
    }

    #[test]
    fn test_user_id_deserialization_validates() {
        let id: UserId = serde_json::from_str("7").unwrap();
        assert_eq!(id.value(), 7);
        assert!(serde_json::from_str::<UserId>("0").is_err());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_string(&UserRole::Instructor).unwrap(),
            "\"INSTRUCTOR\""
        );
        let role: UserRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("student".parse::<UserRole>().unwrap(), UserRole::Student);
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(
            "janitor".parse::<UserRole>(),
            Err(UserValidationError::UnknownRole("janitor".to_string()))
        );
    }

    #[test]
    fn test_identity_creation() {
        let identity =
            UserIdentity::new(UserId::new(1).unwrap(), "test@example.com", UserRole::Student)
                .unwrap();

        assert_eq!(identity.id().value(), 1);
        assert_eq!(identity.email(), "test@example.com");
        assert_eq!(identity.role(), UserRole::Student);
    }

    #[test]
    fn test_identity_rejects_bad_email() {
        let result = UserIdentity::new(UserId::new(1).unwrap(), "not-an-email", UserRole::Admin);
        assert!(result.is_err());
    }
}
