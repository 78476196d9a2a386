//! Authentication infrastructure module
//!
//! This module provides the signing key and the JWT access token service.

mod jwt;
mod signing_key;

pub use jwt::{AccessTokenIssuer, JwtService};
pub use signing_key::{SigningKey, MIN_SECRET_BYTES};
