//! Stack backend abstraction
//!
//! The engine reaches the remote infrastructure service only through this
//! trait, so it can be driven by the HTTP implementation in production and
//! by in-memory fakes in tests.

use async_trait::async_trait;
use stackrun_core::domain::operation::Action;
use stackrun_core::domain::stack::{StackEvent, StackIdentity, StackPresence};
use stackrun_core::dto::stack::SubmitStack;
use std::time::Duration;

use crate::error::Result;
use crate::session::Session;

/// Result of waiting for a stack to settle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The backend reported a terminal status
    Terminal { status: String },
    /// The bounded wait elapsed first
    TimedOut,
}

/// Remote stack-management backend
#[async_trait]
pub trait StackBackend: Send + Sync {
    /// Establishes an authenticated session
    ///
    /// # Arguments
    /// * `profile` - Optional named credential profile
    async fn establish_session(&self, profile: Option<&str>) -> Result<Session>;

    /// Checks whether a stack currently exists
    async fn describe_exists(&self, session: &Session, stack: &StackIdentity)
    -> Result<StackPresence>;

    /// Starts a lifecycle operation
    ///
    /// A refusal by the backend is returned as [`ClientError::Rejected`](crate::ClientError::Rejected).
    async fn submit(
        &self,
        session: &Session,
        stack: &StackIdentity,
        request: &SubmitStack,
    ) -> Result<()>;

    /// Blocks until the stack reaches a terminal status or `timeout` elapses
    async fn wait_for_terminal(
        &self,
        session: &Session,
        stack: &StackIdentity,
        action: Action,
        timeout: Duration,
    ) -> Result<WaitOutcome>;

    /// Fetches the full event history of a stack, oldest first
    ///
    /// A deleted stack can no longer be found by name; pass the `stack_id`
    /// captured before the delete to read its history by id instead.
    async fn fetch_events(
        &self,
        session: &Session,
        stack: &StackIdentity,
        stack_id: Option<&str>,
    ) -> Result<Vec<StackEvent>>;

    /// Turns off the stack's deletion safeguard
    async fn disable_deletion_safeguard(
        &self,
        session: &Session,
        stack: &StackIdentity,
    ) -> Result<()>;
}
