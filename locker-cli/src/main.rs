//! Locker CLI
//!
//! Command-line interface for checking, taking and releasing pipeline locks.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "locker")]
#[command(about = "Pipeline Locker CLI", long_about = None)]
struct Cli {
    /// Locker URL
    #[arg(long, env = "LOCKER_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config {
        locker_url: cli.url,
    };

    handle_command(cli.command, &config).await
}
