//! CLI module for the session kernel
//!
//! Provides operator subcommands:
//! - `migrate`: apply, inspect (`--status`) or revert (`--revert`) PostgreSQL migrations
//! - `issue`: mint an access token for an identity
//! - `verify`: check an access token and print its claims

pub mod migrate;
pub mod token;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// LMS Session - signed access tokens and rotating refresh tokens
#[derive(Parser)]
#[command(name = "lms-session")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply pending database migrations
    Migrate(migrate::MigrateArgs),

    /// Issue an access token for a user
    Issue(token::IssueArgs),

    /// Verify an access token and print its claims
    Verify(token::VerifyArgs),
}

/// Load `.env` and layered configuration, then install logging
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    Ok(config)
}
