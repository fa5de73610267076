//! Pipeline domain types

use serde::{Deserialize, Serialize};

use crate::domain::operation::{Action, OperationDescriptor};

/// How the operations of a pipeline are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// One at a time: creates, then updates, then deletes
    #[default]
    Sequential,
    /// Every operation at once, one worker each
    Parallel,
}

impl std::fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineMode::Sequential => write!(f, "sequential"),
            PipelineMode::Parallel => write!(f, "parallel"),
        }
    }
}

impl std::str::FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(PipelineMode::Sequential),
            "parallel" => Ok(PipelineMode::Parallel),
            other => Err(format!(
                "unknown pipeline type '{}' (expected 'sequential' or 'parallel')",
                other
            )),
        }
    }
}

/// Resolved pipeline ready for execution
///
/// Operations are stored in group order (create, update, delete) and in
/// declaration order within each group.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePlan {
    pub mode: PipelineMode,
    pub operations: Vec<OperationDescriptor>,
}

impl PipelinePlan {
    /// Plan running a single operation
    pub fn single(descriptor: OperationDescriptor) -> Self {
        Self {
            mode: PipelineMode::Sequential,
            operations: vec![descriptor],
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations of a given action, in declaration order
    pub fn group(&self, action: Action) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.iter().filter(move |op| op.action == action)
    }
}
