//! Issue and verify commands

use anyhow::bail;
use chrono::Utc;
use clap::Args;
use tracing::warn;

use crate::domain::{UserId, UserIdentity, UserRole};
use crate::infrastructure::auth::{AccessTokenIssuer, JwtService};

/// Arguments for the issue command
#[derive(Args, Clone)]
pub struct IssueArgs {
    /// Numeric user ID placed in the `sub` claim
    #[arg(long)]
    pub user_id: i64,

    #[arg(long)]
    pub email: String,

    /// STUDENT, INSTRUCTOR or ADMIN
    #[arg(long)]
    pub role: UserRole,
}

/// Arguments for the verify command
#[derive(Args, Clone)]
pub struct VerifyArgs {
    /// Compact JWS access token
    pub token: String,
}

/// Print a freshly signed access token
pub async fn issue(args: IssueArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let service = JwtService::from_config(&config.auth)?;

    let user = UserIdentity::new(UserId::new(args.user_id)?, args.email, args.role)?;
    let token = service.issue(&user, Utc::now())?;

    println!("{}", token);

    Ok(())
}

/// Print the claims of a valid access token
pub async fn verify(args: VerifyArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let service = JwtService::from_config(&config.auth)?;

    match service.verify(args.token.trim(), Utc::now()) {
        Ok(claims) => {
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(())
        }
        Err(e) => {
            warn!(kind = e.kind(), "Token rejected");
            bail!("{}", e.public_message())
        }
    }
}
