//! Pipeline command handler
//!
//! Loads a stack file and a pipeline file and runs every operation they
//! describe.

use anyhow::{Context, Result};
use stackrun_core::definition::load_plan;
use stackrun_core::domain::outcome::PipelineReport;
use stackrun_engine::{Config, PipelineRunner};
use std::path::Path;
use tracing::info;

use crate::report::print_report;

/// Run a full pipeline
///
/// Definitions are resolved before the runner is built, so a broken file
/// never reaches the backend.
pub async fn run_pipeline(
    config: Config,
    stack_file: &Path,
    pipeline_file: &Path,
    json: bool,
) -> Result<PipelineReport> {
    let plan = load_plan(stack_file, pipeline_file).with_context(|| {
        format!(
            "Failed to load pipeline {} with stacks from {}",
            pipeline_file.display(),
            stack_file.display()
        )
    })?;
    info!(
        mode = %plan.mode,
        operations = plan.len(),
        "Loaded pipeline {}",
        pipeline_file.display()
    );

    let runner = PipelineRunner::from_config(config);
    let report = runner.run(&plan).await?;

    print_report(&report, json)?;
    Ok(report)
}
