//! Domain layer - Core entities, traits and errors of the session kernel

pub mod error;
pub mod session;
pub mod user;

pub use error::DomainError;
pub use session::{
    AccessClaims, RefreshToken, RefreshTokenId, RefreshTokenRepository, RefreshTokenState,
    RevokeOutcome, TokenError,
};
pub use user::{UserDirectory, UserId, UserIdentity, UserRole, UserValidationError};
