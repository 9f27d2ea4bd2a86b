use std::process::ExitCode;

use clap::Parser;
use marketplace_accounts::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    cli::run(cli.command).await
}
