#![forbid(unsafe_code)]

//! `rview` binary entry point.

use clap::Parser;
use rview::cli::{Cli, Command, LOG_ENV};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    cli.command.execute().await
}
