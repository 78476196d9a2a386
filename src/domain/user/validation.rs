//! User identity validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors that can occur while building a user identity
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("User ID must be a positive integer, got {0}")]
    InvalidId(i64),

    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Email '{0}' is not a valid address")]
    InvalidEmail(String),

    #[error("Unknown role '{0}'. Expected one of STUDENT, INSTRUCTOR, ADMIN")]
    UnknownRole(String),
}

const MAX_EMAIL_LENGTH: usize = 255;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid email regex"));

/// Validate a user ID
///
/// Identifiers come from the persistence layer's sequence, so anything
/// below 1 was never issued.
pub fn validate_user_id(id: i64) -> Result<(), UserValidationError> {
    if id < 1 {
        return Err(UserValidationError::InvalidId(id));
    }

    Ok(())
}

/// Validate an email address
///
/// Only the shape is checked here; deliverability is the account service's concern.
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.is_empty() {
        return Err(UserValidationError::EmptyEmail);
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(UserValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(UserValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}
