//! Session infrastructure module
//!
//! This module provides refresh token generation and persistence, the
//! refresh token store, and the session lifecycle service.

mod generator;
mod in_memory;
mod postgres_repository;
mod service;
mod store;

pub use generator::{RefreshTokenGenerator, MIN_TOKEN_BYTES};
pub use in_memory::InMemoryRefreshTokenRepository;
pub use postgres_repository::PostgresRefreshTokenRepository;
pub use service::{SessionService, SessionTokens};
pub use store::{ClientInfo, RefreshTokenStore};
