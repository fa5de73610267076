//! Fatal pipeline errors
//!
//! Both variants abort the run before any operation starts; failures of
//! individual operations are reported through the outcomes instead.

use stackrun_client::ClientError;
use stackrun_core::DefinitionError;
use thiserror::Error;

/// Errors that prevent a pipeline from running at all
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Stack or pipeline definitions are malformed or incomplete
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// The backend session could not be established
    #[error("Unable to establish a session with the stack backend: {0}")]
    Authentication(#[source] ClientError),
}

impl PipelineError {
    /// Whether the error came from the definitions rather than the backend
    pub fn is_definition(&self) -> bool {
        matches!(self, Self::Definition(_))
    }
}
