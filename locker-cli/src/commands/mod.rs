//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipeline;

use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check whether a pipeline may be deployed (exit code 2 when locked, 1 on errors)
    Status {
        /// Project name
        project: String,
        /// Environment name
        environment: String,
    },
    /// Lock a pipeline
    Lock {
        /// Project name
        project: String,
        /// Environment name
        environment: String,
        /// Lock owner, defaults to $USER
        #[arg(long, env = "LOCKER_USER")]
        by: Option<String>,
    },
    /// Unlock a pipeline
    Unlock {
        /// Project name
        project: String,
        /// Environment name
        environment: String,
    },
    /// List locked pipelines
    List {
        /// Print the raw JSON list
        #[arg(long)]
        json: bool,
    },
}

/// Handle a CLI command
///
/// # Returns
/// The process exit code. Only `status` on a locked pipeline exits non-zero
/// without an error.
pub async fn handle_command(command: Commands, config: &Config) -> Result<ExitCode> {
    pipeline::handle_pipeline_command(command, config).await
}
