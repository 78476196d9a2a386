//! Refresh token repository factory

use std::sync::Arc;

use tracing::info;

use super::migrations::run_storage_migrations;
use super::postgres::{connect_pool, PostgresConfig};
use crate::config::StorageConfig;
use crate::domain::{DomainError, RefreshTokenRepository};
use crate::infrastructure::session::{
    InMemoryRefreshTokenRepository, PostgresRefreshTokenRepository,
};

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Build the refresh token repository selected by configuration
///
/// The PostgreSQL backend applies pending migrations before returning.
pub async fn create_refresh_token_repository(
    config: &StorageConfig,
) -> Result<Arc<dyn RefreshTokenRepository>, DomainError> {
    let backend = StorageType::from_str(&config.backend).ok_or_else(|| {
        DomainError::configuration(format!("Unknown storage backend '{}'", config.backend))
    })?;

    info!("Storage backend: {:?}", backend);

    match backend {
        StorageType::InMemory => Ok(Arc::new(InMemoryRefreshTokenRepository::new())),
        StorageType::Postgres => {
            let pool = connect_pool(&postgres_config(config)?).await?;
            run_storage_migrations(&pool).await?;

            Ok(Arc::new(PostgresRefreshTokenRepository::new(pool)))
        }
    }
}

/// Pool settings for the configured database
pub fn postgres_config(config: &StorageConfig) -> Result<PostgresConfig, DomainError> {
    let url = config.resolve_database_url().ok_or_else(|| {
        DomainError::configuration(
            "storage.database_url or DATABASE_URL is required for the postgres backend",
        )
    })?;

    Ok(PostgresConfig::new(url)
        .with_max_connections(config.max_connections)
        .with_connect_timeout(config.connect_timeout_secs))
}
