//! Migrate command - applies, inspects or reverts storage migrations

use clap::Args;
use tracing::info;

use crate::infrastructure::storage::{
    connect_pool, postgres_config, revert_latest_storage_migration, run_storage_migrations,
    PostgresMigrator,
};

/// Arguments for the migrate command
#[derive(Args, Clone, Debug, Default)]
pub struct MigrateArgs {
    /// Print the latest applied migration version and exit
    #[arg(long)]
    pub status: bool,

    /// Revert the most recently applied migration
    #[arg(long, conflicts_with = "status")]
    pub revert: bool,
}

/// Run the migrate command against the configured PostgreSQL database
pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let pool = connect_pool(&postgres_config(&config.storage)?).await?;

    if args.status {
        let version = PostgresMigrator::new(pool.clone()).current_version().await?;

        match version {
            Some(version) => println!("Current migration version: {}", version),
            None => println!("No migrations applied"),
        }
    } else if args.revert {
        match revert_latest_storage_migration(&pool).await? {
            Some(version) => info!(version, "Reverted latest migration"),
            None => info!("No migrations to revert"),
        }
    } else {
        let applied = run_storage_migrations(&pool).await?;
        info!(applied, "Migrations complete");
    }

    pool.close().await;

    Ok(())
}
