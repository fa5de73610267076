//! Outcome domain types
//!
//! Outcomes are produced once per operation by the executor and owned by
//! the scheduler afterwards. A report aggregates every outcome of one run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::operation::{Action, CorrelationToken, OperationDescriptor};
use crate::domain::pipeline::PipelineMode;

/// Final state of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalState {
    Completed,
    Failed,
    /// Not attempted (dry run)
    Skipped,
}

impl std::fmt::Display for FinalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalState::Completed => write!(f, "Completed"),
            FinalState::Failed => write!(f, "Failed"),
            FinalState::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Where a failure originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Local inputs were incomplete or unreadable
    Input,
    /// The backend could not be reached or answered with an error
    Backend,
    /// The backend refused the request
    Rejected,
    /// The target stack does not exist
    NotFound,
    /// A resource of the stack reported a failed status
    Resource,
}

/// One reason an operation failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub resource_id: String,
    pub reason: String,
    pub kind: FailureKind,
}

impl FailureReason {
    pub fn new(kind: FailureKind, resource_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            reason: reason.into(),
            kind,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "- *{}* <> {}", self.resource_id, self.reason)
    }
}

/// Result of one operation against one stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub stack_name: String,
    pub action: Action,
    pub state: FinalState,
    pub reasons: Vec<FailureReason>,
    pub region: String,
    pub account: String,
    pub token: Option<CorrelationToken>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl OperationOutcome {
    fn from_descriptor(
        descriptor: &OperationDescriptor,
        state: FinalState,
        reasons: Vec<FailureReason>,
        token: Option<CorrelationToken>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            stack_name: descriptor.stack.name.clone(),
            action: descriptor.action,
            state,
            reasons,
            region: descriptor.stack.region.clone(),
            account: descriptor.stack.account.clone(),
            token,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Builds a classified outcome; any reason makes it a failure
    pub fn classified(
        descriptor: &OperationDescriptor,
        token: CorrelationToken,
        reasons: Vec<FailureReason>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let state = if reasons.is_empty() {
            FinalState::Completed
        } else {
            FinalState::Failed
        };
        Self::from_descriptor(descriptor, state, reasons, Some(token), started_at)
    }

    /// Builds a failed outcome carrying a single reason
    pub fn failed(
        descriptor: &OperationDescriptor,
        token: Option<CorrelationToken>,
        reason: FailureReason,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self::from_descriptor(descriptor, FinalState::Failed, vec![reason], token, started_at)
    }

    /// Builds an outcome for an operation that was not attempted
    pub fn skipped(descriptor: &OperationDescriptor) -> Self {
        Self::from_descriptor(descriptor, FinalState::Skipped, Vec::new(), None, Utc::now())
    }

    pub fn is_failed(&self) -> bool {
        self.state == FinalState::Failed
    }

    /// Backend-style status label, e.g. `DELETE_COMPLETE`
    pub fn status_label(&self) -> String {
        match self.state {
            FinalState::Completed => self.action.complete_status(),
            FinalState::Failed => self.action.failed_status(),
            FinalState::Skipped => format!("{}_SKIPPED", self.action),
        }
    }

    /// Human readable failure message, `None` unless the outcome failed
    pub fn failure_message(&self) -> Option<String> {
        if !self.is_failed() {
            return None;
        }
        let reasons = self
            .reasons
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Some(format!(
            "Stack {} process ended with status {}.\nFailure reasons :\n{}",
            self.action.to_string().to_lowercase(),
            self.status_label(),
            reasons
        ))
    }
}

/// Aggregate of all outcomes of one pipeline invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub mode: PipelineMode,
    pub outcomes: Vec<OperationOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineReport {
    /// The run failed if any single operation failed
    pub fn is_failed(&self) -> bool {
        self.outcomes.iter().any(OperationOutcome::is_failed)
    }

    pub fn count(&self, state: FinalState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }
}
