//! User domain
//!
//! The session kernel does not own users. This module holds the identity
//! projection tokens are minted from, its validation, and the directory
//! trait used to refresh that projection.

mod directory;
mod entity;
mod validation;

pub use directory::UserDirectory;
pub use entity::{UserId, UserIdentity, UserRole};
pub use validation::{validate_email, validate_user_id, UserValidationError};

#[cfg(test)]
pub use directory::MockUserDirectory;
