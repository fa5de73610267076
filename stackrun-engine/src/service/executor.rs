//! Operation executor
//!
//! Runs the full lifecycle of one operation against one stack:
//! - Checking the descriptor and the template it references
//! - Submitting the operation (after existence and safeguard handling for deletes)
//! - Waiting for the backend to settle, within a bound
//! - Classifying the result from the event history
//! - Notifying the configured sink
//!
//! Expected failures never escape as errors; they become a Failed outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stackrun_client::{ClientError, Session, StackBackend, WaitOutcome};
use stackrun_core::definition::validate_template;
use stackrun_core::domain::operation::{Action, CorrelationToken, OperationDescriptor};
use stackrun_core::domain::outcome::{FailureKind, FailureReason, OperationOutcome};
use stackrun_core::domain::stack::StackPresence;
use stackrun_core::dto::stack::SubmitStack;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::service::notification::{Notification, NotificationSink};
use crate::service::outcome::OutcomeCollector;

/// Bound on delivering one notification
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Service trait for executing a single stack operation
#[async_trait]
pub trait OperationExecutor: Send + Sync {
    /// Executes one operation and returns its outcome
    ///
    /// Implementations must not panic or error on remote failures; those are
    /// reported through the returned outcome.
    async fn execute(&self, descriptor: &OperationDescriptor) -> OperationOutcome;
}

/// Standard implementation of OperationExecutor backed by a [`StackBackend`]
pub struct StandardOperationExecutor {
    backend: Arc<dyn StackBackend>,
    session: Arc<Session>,
    collector: OutcomeCollector,
    sink: Arc<dyn NotificationSink>,
    wait_timeout: Duration,
    notify_timeout: Duration,
}

impl StandardOperationExecutor {
    /// Creates a new executor
    ///
    /// # Arguments
    /// * `backend` - The stack backend
    /// * `session` - Session established for this invocation
    /// * `sink` - Where to send one notification per operation
    /// * `wait_timeout` - Bound on waiting for a terminal state
    pub fn new(
        backend: Arc<dyn StackBackend>,
        session: Arc<Session>,
        sink: Arc<dyn NotificationSink>,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            collector: OutcomeCollector::new(Arc::clone(&backend)),
            backend,
            session,
            sink,
            wait_timeout,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    /// Sets how long a notification may take before it is dropped
    pub fn with_notify_timeout(mut self, notify_timeout: Duration) -> Self {
        self.notify_timeout = notify_timeout;
        self
    }

    /// Runs the lifecycle without notifying
    async fn run(&self, descriptor: &OperationDescriptor, started_at: DateTime<Utc>) -> OperationOutcome {
        let stack_name = descriptor.stack.name.as_str();

        if let Some(field) = descriptor.missing_field() {
            return OperationOutcome::failed(
                descriptor,
                None,
                FailureReason::new(
                    FailureKind::Input,
                    stack_name,
                    format!("The {} property is missing from the operation", field),
                ),
                started_at,
            );
        }

        let token = CorrelationToken::generate();
        info!(
            stack = %descriptor.stack,
            action = %descriptor.action,
            token = %token,
            "Starting operation"
        );

        let template_body = match self.load_template(descriptor).await {
            Ok(body) => body,
            Err(reason) => {
                return OperationOutcome::failed(descriptor, Some(token), reason, started_at);
            }
        };

        let stack_id = match self.start(descriptor, &token, template_body).await {
            Ok(stack_id) => stack_id,
            Err(reason) => {
                return OperationOutcome::failed(descriptor, Some(token), reason, started_at);
            }
        };

        match self
            .backend
            .wait_for_terminal(
                &self.session,
                &descriptor.stack,
                descriptor.action,
                self.wait_timeout,
            )
            .await
        {
            Ok(WaitOutcome::Terminal { status }) => {
                debug!(stack = %stack_name, status = %status, "Operation reached a terminal state");
            }
            Ok(WaitOutcome::TimedOut) => {
                warn!(
                    stack = %stack_name,
                    "No terminal state after {:?}, classifying from events",
                    self.wait_timeout
                );
            }
            Err(e) => {
                warn!(stack = %stack_name, "Waiting failed ({}), classifying from events", e);
            }
        }

        match self
            .collector
            .classify(
                &self.session,
                &descriptor.stack,
                stack_id.as_deref(),
                &token,
            )
            .await
        {
            Ok((_, reasons)) => OperationOutcome::classified(descriptor, token, reasons, started_at),
            Err(e) => OperationOutcome::failed(
                descriptor,
                Some(token),
                backend_failure(stack_name, "Unable to fetch stack events", e),
                started_at,
            ),
        }
    }

    /// Reads the template and checks that it declares resources
    async fn load_template(&self, descriptor: &OperationDescriptor) -> Result<String, FailureReason> {
        let stack_name = descriptor.stack.name.as_str();
        let body = tokio::fs::read_to_string(&descriptor.template)
            .await
            .map_err(|e| {
                FailureReason::new(
                    FailureKind::Input,
                    stack_name,
                    format!(
                        "Unable to read template {}: {}",
                        descriptor.template.display(),
                        e
                    ),
                )
            })?;

        validate_template(stack_name, &descriptor.template, &body)
            .map_err(|e| FailureReason::new(FailureKind::Input, stack_name, e.to_string()))?;

        Ok(body)
    }

    /// Issues the remote request(s) that start the operation
    ///
    /// Returns the stack id captured before a delete, so the history of the
    /// deleted stack can still be read.
    async fn start(
        &self,
        descriptor: &OperationDescriptor,
        token: &CorrelationToken,
        template_body: String,
    ) -> Result<Option<String>, FailureReason> {
        let stack = &descriptor.stack;
        let stack_name = stack.name.as_str();
        let mut stack_id = None;

        let request = match descriptor.action {
            Action::Delete => {
                match self.backend.describe_exists(&self.session, stack).await {
                    Ok(StackPresence::Exists { stack_id: id }) => {
                        debug!(stack = %stack_name, stack_id = %id, "Stack exists");
                        stack_id = Some(id);
                    }
                    Ok(StackPresence::NotFound) => {
                        return Err(FailureReason::new(
                            FailureKind::NotFound,
                            stack_name,
                            format!("Stack {} does not exist and cannot be deleted", stack),
                        ));
                    }
                    Err(e) => {
                        return Err(backend_failure(
                            stack_name,
                            "Unable to check if stack exists",
                            e,
                        ));
                    }
                }

                self.backend
                    .disable_deletion_safeguard(&self.session, stack)
                    .await
                    .map_err(|e| {
                        backend_failure(stack_name, "Unable to disable termination protection", e)
                    })?;

                SubmitStack {
                    action: Action::Delete,
                    stack_name: stack_name.to_string(),
                    template_body: String::new(),
                    parameters: Default::default(),
                    client_request_token: token.clone(),
                }
            }
            action => SubmitStack {
                action,
                stack_name: stack_name.to_string(),
                template_body,
                parameters: descriptor.effective_parameters(),
                client_request_token: token.clone(),
            },
        };

        self.backend
            .submit(&self.session, stack, &request)
            .await
            .map_err(|e| {
                let context = format!(
                    "Unable to start stack {} process",
                    descriptor.action.to_string().to_lowercase()
                );
                backend_failure(stack_name, &context, e)
            })?;

        Ok(stack_id)
    }

    /// Sends the notification; failures and slow sinks are logged and dropped
    async fn notify(&self, outcome: &OperationOutcome) {
        let notification = Notification::from_outcome(outcome, self.session.profile());
        match tokio::time::timeout(self.notify_timeout, self.sink.notify(&notification)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(stack = %outcome.stack_name, "Failed to deliver notification: {}", e);
            }
            Err(_) => {
                warn!(
                    stack = %outcome.stack_name,
                    "Notification not delivered within {:?}, giving up",
                    self.notify_timeout
                );
            }
        }
    }
}

#[async_trait]
impl OperationExecutor for StandardOperationExecutor {
    async fn execute(&self, descriptor: &OperationDescriptor) -> OperationOutcome {
        let started_at = Utc::now();
        let outcome = self.run(descriptor, started_at).await;

        if outcome.is_failed() {
            error!(
                stack = %outcome.stack_name,
                action = %outcome.action,
                reasons = outcome.reasons.len(),
                "{} for stack {}",
                outcome.status_label(),
                outcome.stack_name
            );
        } else {
            info!(
                stack = %outcome.stack_name,
                action = %outcome.action,
                "{} for stack {}",
                outcome.status_label(),
                outcome.stack_name
            );
        }

        self.notify(&outcome).await;
        outcome
    }
}

/// Maps a backend error to a failure reason for the operation
fn backend_failure(stack_name: &str, context: &str, err: ClientError) -> FailureReason {
    let kind = match err {
        ClientError::Rejected(_) => FailureKind::Rejected,
        _ => FailureKind::Backend,
    };
    FailureReason::new(kind, stack_name, format!("{}. Exception = {}", context, err))
}
