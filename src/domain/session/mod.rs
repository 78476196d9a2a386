//! Session domain
//!
//! Types shared by the access-token issuer, the refresh-token store and the
//! session lifecycle manager: access claims, the refresh token record, the
//! persistence trait for refresh tokens and the error taxonomy.

mod claims;
mod error;
mod refresh_token;
mod repository;

pub use claims::AccessClaims;
pub use error::{TokenError, REAUTHENTICATE_MESSAGE};
pub use refresh_token::{RefreshToken, RefreshTokenId, RefreshTokenState};
pub use repository::{RefreshTokenRepository, RevokeOutcome};

#[cfg(test)]
pub use repository::MockRefreshTokenRepository;
