//! Definition loading
//!
//! Turns the declarative stack file and pipeline file into a
//! [`PipelinePlan`](crate::domain::pipeline::PipelinePlan). Every check
//! here happens before any remote call; a failure aborts the invocation.

mod pipeline_file;
mod stack_file;
mod template;

pub use pipeline_file::{PipelineEntry, PipelineFile};
pub use stack_file::{StackDefinition, StackFile};
pub use template::validate_template;

use std::path::Path;

use crate::domain::operation::{Action, OperationDescriptor, SecretOverride};
use crate::domain::pipeline::PipelinePlan;
use crate::error::Result;

/// Loads both definition files and resolves them into a plan
pub fn load_plan(stack_file: &Path, pipeline_file: &Path) -> Result<PipelinePlan> {
    let stacks = StackFile::from_path(stack_file)?;
    let pipeline = PipelineFile::from_path(pipeline_file)?;
    resolve_plan(&stacks, &pipeline)
}

/// Resolves every pipeline entry against the stack file
///
/// Operations come out grouped as create, update, delete, each group in
/// declaration order.
pub fn resolve_plan(stacks: &StackFile, pipeline: &PipelineFile) -> Result<PipelinePlan> {
    let mode = pipeline.mode()?;

    let mut operations = Vec::new();
    for action in [Action::Create, Action::Update, Action::Delete] {
        for entry in pipeline.entries(action) {
            operations.push(resolve_operation(
                stacks,
                &entry.stack_name,
                action,
                entry.secrets.clone(),
            )?);
        }
    }

    Ok(PipelinePlan { mode, operations })
}

/// Resolves a single stack into an operation descriptor
pub fn resolve_operation(
    stacks: &StackFile,
    stack_name: &str,
    action: Action,
    secrets: Vec<SecretOverride>,
) -> Result<OperationDescriptor> {
    let definition = stacks.resolve(stack_name)?;
    Ok(definition.into_descriptor(stack_name, action, secrets))
}
