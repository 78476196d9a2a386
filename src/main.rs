use clap::Parser;
use lms_session::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate(args) => cli::migrate::run(args).await,
        Command::Issue(args) => cli::token::issue(args).await,
        Command::Verify(args) => cli::token::verify(args).await,
    }
}
