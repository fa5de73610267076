//! Stack DTOs for communication with the stack backend

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::operation::{Action, CorrelationToken};
use crate::domain::stack::StackEvent;

/// Request to start a lifecycle operation on a stack
///
/// Parameter values may contain secrets, so `Debug` only lists their names.
#[derive(Clone, Serialize, Deserialize)]
pub struct SubmitStack {
    pub action: Action,
    pub stack_name: String,
    /// Template body; empty for deletes
    #[serde(default)]
    pub template_body: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    pub client_request_token: CorrelationToken,
}

impl std::fmt::Debug for SubmitStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmitStack")
            .field("action", &self.action)
            .field("stack_name", &self.stack_name)
            .field("template_bytes", &self.template_body.len())
            .field("parameters", &self.parameters.keys().collect::<Vec<_>>())
            .field("client_request_token", &self.client_request_token)
            .finish()
    }
}

/// Stack description returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackDescription {
    pub stack_id: String,
    pub stack_name: String,
    pub status: String,
}

/// Current status of a stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackStatus {
    pub status: String,
}

impl StackStatus {
    /// Whether the status will not change without new input
    pub fn is_terminal(&self) -> bool {
        !self.status.ends_with("_IN_PROGRESS")
            && (self.status.ends_with("_COMPLETE") || self.status.ends_with("_FAILED"))
    }
}

/// Event history of a stack, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackEvents {
    pub events: Vec<StackEvent>,
}

/// Request to toggle the deletion safeguard of a stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionProtection {
    pub enabled: bool,
}

/// Principal behind an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub principal: String,
}
