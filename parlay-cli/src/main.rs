//! parlay entry point.

use clap::Parser;
use parlay_cli::commands::Cli;
use parlay_cli::error::CliError;
use parlay_cli::{run, telemetry};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    telemetry::init_tracing()?;
    run(cli).await
}
