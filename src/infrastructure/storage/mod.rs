//! Storage infrastructure - Connection pooling, migrations and backend selection

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{create_refresh_token_repository, postgres_config, StorageType};
pub use migrations::{
    revert_latest_storage_migration, run_storage_migrations, storage_migration, Migration,
    PostgresMigrator,
};
pub use postgres::{connect_pool, PostgresConfig};
