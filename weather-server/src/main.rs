//! Binary crate for the `weather-server` tool host.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Loading the env file and building the immutable config
//! - Logging setup and the stdin/stdout dispatch loop

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
