//! LMS Session
//!
//! The session-token kernel of a learning-management application:
//! - HS256-signed, short-lived access tokens carrying identity claims
//! - Opaque, persisted refresh tokens bound to a user and device
//! - Rotation on refresh with single-use guarantees under concurrency
//! - Logout from one device or from every device

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::UserDirectory;
use infrastructure::{
    auth::{JwtService, SigningKey},
    session::{RefreshTokenStore, SessionService},
    storage::create_refresh_token_repository,
};
use tracing::info;

/// Wire a session service from configuration
///
/// The signing key and both token lifetimes are validated before any storage
/// is touched, so bad auth settings fail startup without opening a database
/// connection.
pub async fn create_session_service(
    config: &AppConfig,
    directory: Arc<dyn UserDirectory>,
) -> anyhow::Result<SessionService> {
    let key = Arc::new(SigningKey::from_config(&config.auth)?);
    let issuer = Arc::new(JwtService::with_key(key, &config.auth)?);
    let refresh_lifetime = RefreshTokenStore::lifetime_from_config(&config.auth)?;

    let repository = create_refresh_token_repository(&config.storage).await?;
    let store = RefreshTokenStore::new(repository, refresh_lifetime);

    info!(
        access_token_lifetime_seconds = config.auth.access_token_lifetime_seconds,
        refresh_token_lifetime_days = config.auth.refresh_token_lifetime_days,
        "Session service ready"
    );

    Ok(SessionService::new(issuer, store, directory))
}
