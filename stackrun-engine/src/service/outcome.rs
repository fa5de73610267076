//! Outcome collector
//!
//! Decides whether an operation succeeded by reading the stack's event
//! history. Only events carrying the attempt's own correlation token are
//! considered, so failures left behind by an earlier or concurrent attempt
//! on the same stack are never attributed to this one.

use stackrun_client::{Result, Session, StackBackend};
use stackrun_core::domain::operation::CorrelationToken;
use stackrun_core::domain::outcome::{FailureKind, FailureReason, FinalState};
use stackrun_core::domain::stack::{StackEvent, StackIdentity};
use std::sync::Arc;
use tracing::debug;

/// Classifies operations from the remote event history
#[derive(Clone)]
pub struct OutcomeCollector {
    backend: Arc<dyn StackBackend>,
}

impl OutcomeCollector {
    pub fn new(backend: Arc<dyn StackBackend>) -> Self {
        Self { backend }
    }

    /// Fetches the event history and classifies the attempt identified by `token`
    ///
    /// `stack_id` selects the history by id, which deleted stacks need.
    /// Read-only; calling it again on an unchanged history gives the same answer.
    pub async fn classify(
        &self,
        session: &Session,
        stack: &StackIdentity,
        stack_id: Option<&str>,
        token: &CorrelationToken,
    ) -> Result<(FinalState, Vec<FailureReason>)> {
        let events = self.backend.fetch_events(session, stack, stack_id).await?;
        debug!(
            stack = %stack.name,
            token = %token,
            events = events.len(),
            "Classifying operation from event history"
        );
        Ok(classify_events(&events, token))
    }
}

/// Classifies an attempt from an already fetched event history
pub fn classify_events(
    events: &[StackEvent],
    token: &CorrelationToken,
) -> (FinalState, Vec<FailureReason>) {
    let reasons: Vec<FailureReason> = events
        .iter()
        .filter(|event| event.correlation_token.as_deref() == Some(token.as_str()))
        .filter(|event| event.is_failure())
        .map(|event| {
            let reason = event
                .status_reason
                .clone()
                .unwrap_or_else(|| event.status.clone());
            FailureReason::new(FailureKind::Resource, event.resource_id.clone(), reason)
        })
        .collect();

    let state = if reasons.is_empty() {
        FinalState::Completed
    } else {
        FinalState::Failed
    };

    (state, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(token: Option<&str>, resource: &str, status: &str, reason: Option<&str>) -> StackEvent {
        StackEvent {
            correlation_token: token.map(str::to_string),
            resource_id: resource.to_string(),
            status: status.to_string(),
            status_reason: reason.map(str::to_string),
            timestamp: None,
        }
    }

    #[test]
    fn test_no_failures_is_completed() {
        let token = CorrelationToken::sanitized("current");
        let events = vec![
            event(Some("current"), "Bucket", "DELETE_IN_PROGRESS", None),
            event(Some("current"), "Bucket", "DELETE_COMPLETE", None),
            event(Some("current"), "WebApp", "DELETE_COMPLETE", None),
        ];

        let (state, reasons) = classify_events(&events, &token);
        assert_eq!(state, FinalState::Completed);
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_failures_keep_event_order() {
        let token = CorrelationToken::sanitized("current");
        let events = vec![
            event(Some("current"), "Queue", "CREATE_FAILED", Some("quota exceeded")),
            event(Some("current"), "Bucket", "CREATE_COMPLETE", None),
            event(Some("current"), "Topic", "CREATE_FAILED", None),
        ];

        let (state, reasons) = classify_events(&events, &token);
        assert_eq!(state, FinalState::Failed);
        assert_eq!(
            reasons,
            vec![
                FailureReason::new(FailureKind::Resource, "Queue", "quota exceeded"),
                FailureReason::new(FailureKind::Resource, "Topic", "CREATE_FAILED"),
            ]
        );
    }

    #[test]
    fn test_other_attempts_are_ignored() {
        let token = CorrelationToken::sanitized("current");
        let events = vec![
            event(Some("previous"), "Queue", "CREATE_FAILED", Some("old failure")),
            event(None, "Bucket", "DELETE_FAILED", Some("manual change")),
            event(Some("current"), "Queue", "UPDATE_COMPLETE", None),
        ];

        let (state, reasons) = classify_events(&events, &token);
        assert_eq!(state, FinalState::Completed);
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let token = CorrelationToken::sanitized("current");
        let events = vec![
            event(Some("current"), "Queue", "UPDATE_FAILED", Some("invalid property")),
            event(Some("other"), "Bucket", "UPDATE_FAILED", Some("other attempt")),
        ];

        let first = classify_events(&events, &token);
        let second = classify_events(&events, &token);
        assert_eq!(first, second);
        assert_eq!(first.1.len(), 1);
    }
}
