//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipeline;
mod stack;

use anyhow::Result;
use clap::Subcommand;
use stackrun_core::domain::operation::{Action, SecretOverride};
use stackrun_core::domain::outcome::PipelineReport;
use stackrun_engine::Config;
use std::path::PathBuf;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a full pipeline definition
    Pipeline {
        /// Path to the stack definition file
        #[arg(short, long)]
        stack_file: PathBuf,

        /// Path to the pipeline definition file
        #[arg(short, long)]
        pipeline_file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a single stack
    Create {
        /// Stack name as declared in the stack file
        stack: String,

        /// Path to the stack definition file
        #[arg(short, long)]
        stack_file: PathBuf,

        /// Secret parameter overrides as NAME=VALUE pairs
        #[arg(long, value_parser = parse_secret)]
        secret: Vec<SecretOverride>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a single stack
    Update {
        /// Stack name as declared in the stack file
        stack: String,

        /// Path to the stack definition file
        #[arg(short, long)]
        stack_file: PathBuf,

        /// Secret parameter overrides as NAME=VALUE pairs
        #[arg(long, value_parser = parse_secret)]
        secret: Vec<SecretOverride>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a single stack
    Delete {
        /// Stack name as declared in the stack file
        stack: String,

        /// Path to the stack definition file
        #[arg(short, long)]
        stack_file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse a single NAME=VALUE secret override
fn parse_secret(s: &str) -> Result<SecretOverride> {
    SecretOverride::parse(s)
        .ok_or_else(|| anyhow::anyhow!("invalid NAME=VALUE: no `=` found in `{}`", s))
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The engine configuration
///
/// # Returns
/// The report of the run; fatal errors abort before any operation starts
pub async fn handle_command(command: Commands, config: Config) -> Result<PipelineReport> {
    match command {
        Commands::Pipeline {
            stack_file,
            pipeline_file,
            json,
        } => pipeline::run_pipeline(config, &stack_file, &pipeline_file, json).await,
        Commands::Create {
            stack,
            stack_file,
            secret,
            json,
        } => stack::run_single(config, Action::Create, &stack, &stack_file, secret, json).await,
        Commands::Update {
            stack,
            stack_file,
            secret,
            json,
        } => stack::run_single(config, Action::Update, &stack, &stack_file, secret, json).await,
        Commands::Delete {
            stack,
            stack_file,
            json,
        } => stack::run_single(config, Action::Delete, &stack, &stack_file, Vec::new(), json).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secret() {
        let secret = parse_secret("DbPassword=a=b").unwrap();
        assert_eq!(secret, SecretOverride::new("DbPassword", "a=b"));
        assert!(parse_secret("DbPassword").is_err());
    }
}
