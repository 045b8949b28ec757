//! Pipeline command handlers

use anyhow::{Context, Result, bail};
use colored::*;
use locker_client::LockerClient;
use locker_core::domain::{Pipeline, PipelineIdentifier};
use locker_core::dto::pipeline::LockRequest;
use std::process::ExitCode;

use super::Commands;
use crate::config::{Config, resolve_owner};

/// Exit code of `status` for a locked pipeline. Errors exit with 1.
const LOCKED_EXIT_CODE: u8 = 2;

pub async fn handle_pipeline_command(command: Commands, config: &Config) -> Result<ExitCode> {
    let client = LockerClient::new(&config.locker_url);

    match command {
        Commands::Status {
            project,
            environment,
        } => status(&client, PipelineIdentifier::new(project, environment)).await,
        Commands::Lock {
            project,
            environment,
            by,
        } => {
            let Some(owner) = resolve_owner(by, |key| std::env::var(key).ok()) else {
                bail!("No lock owner given: pass --by or set LOCKER_USER");
            };
            lock(&client, PipelineIdentifier::new(project, environment), owner).await
        }
        Commands::Unlock {
            project,
            environment,
        } => unlock(&client, PipelineIdentifier::new(project, environment)).await,
        Commands::List { json } => list(&client, json).await,
    }
}

async fn status(client: &LockerClient, pipeline: PipelineIdentifier) -> Result<ExitCode> {
    let allowed = client
        .is_deploy_allowed(&pipeline)
        .await
        .with_context(|| format!("Failed to check status of {}", pipeline))?;

    if allowed {
        println!("{} {} may be deployed", "✓".green().bold(), pipeline.to_string().bold());
    } else {
        println!("{} {} is locked", "✗".red().bold(), pipeline.to_string().bold());
    }

    Ok(ExitCode::from(status_exit_code(allowed)))
}

fn status_exit_code(allowed: bool) -> u8 {
    if allowed { 0 } else { LOCKED_EXIT_CODE }
}

async fn lock(client: &LockerClient, pipeline: PipelineIdentifier, owner: String) -> Result<ExitCode> {
    let request = LockRequest::new(pipeline.clone(), owner);

    let record = match client.lock(&request).await {
        Ok(record) => record,
        Err(err) if err.is_already_locked() => {
            bail!("Pipeline {} is already locked", pipeline);
        }
        Err(err) => return Err(err).with_context(|| format!("Failed to lock {}", pipeline)),
    };

    println!("{}", "✓ Pipeline locked".green().bold());
    print_pipeline(&record);

    Ok(ExitCode::SUCCESS)
}

async fn unlock(client: &LockerClient, pipeline: PipelineIdentifier) -> Result<ExitCode> {
    client
        .unlock(&pipeline)
        .await
        .with_context(|| format!("Failed to unlock {}", pipeline))?;

    println!(
        "{}",
        format!("✓ Pipeline {} unlocked", pipeline).green().bold()
    );

    Ok(ExitCode::SUCCESS)
}

async fn list(client: &LockerClient, json: bool) -> Result<ExitCode> {
    let pipelines = client
        .locked_pipelines()
        .await
        .context("Failed to list locked pipelines")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pipelines)?);
    } else if pipelines.is_empty() {
        println!("{}", "No locked pipelines.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} locked pipeline(s):", pipelines.len()).bold()
        );
        println!();
        for pipeline in &pipelines {
            print_pipeline(pipeline);
            println!();
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_pipeline(pipeline: &Pipeline) {
    println!("  {} {}", "▸".cyan(), pipeline.identifier.to_string().bold());
    println!("    Locked by: {}", pipeline.locked_by.cyan());
    if let Some(locked_at) = pipeline.locked_at {
        println!(
            "    Locked at: {}",
            locked_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_exit_codes() {
        assert_eq!(status_exit_code(true), 0);
        assert_eq!(status_exit_code(false), LOCKED_EXIT_CODE);
        // 1 is what `main` exits with on an error
        assert_ne!(status_exit_code(false), 1);
    }
}
