//! Single-stack command handlers
//!
//! Create, update or delete one stack through the same engine a pipeline
//! uses.

use anyhow::{Context, Result};
use stackrun_core::definition::{StackFile, resolve_operation};
use stackrun_core::domain::operation::{Action, SecretOverride};
use stackrun_core::domain::outcome::PipelineReport;
use stackrun_core::domain::pipeline::PipelinePlan;
use stackrun_engine::{Config, PipelineRunner};
use std::path::Path;

use crate::report::print_report;

/// Run one operation on one stack
pub async fn run_single(
    config: Config,
    action: Action,
    stack_name: &str,
    stack_file: &Path,
    secrets: Vec<SecretOverride>,
    json: bool,
) -> Result<PipelineReport> {
    let stacks = StackFile::from_path(stack_file)
        .with_context(|| format!("Failed to load stack file {}", stack_file.display()))?;
    let descriptor = resolve_operation(&stacks, stack_name, action, secrets)?;

    let runner = PipelineRunner::from_config(config);
    let report = runner.run(&PipelinePlan::single(descriptor)).await?;

    print_report(&report, json)?;
    Ok(report)
}
