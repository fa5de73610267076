//! Notification service
//!
//! Delivers one notification per finished operation. Delivery is
//! fire-and-forget from the executor's point of view: a sink error is logged
//! and never changes the outcome of the operation.

use async_trait::async_trait;
use reqwest::Client;
use stackrun_core::domain::operation::Action;
use stackrun_core::domain::outcome::OperationOutcome;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;

/// Errors raised while delivering a notification
#[derive(Debug, Error)]
pub enum SinkError {
    /// The notification endpoint could not be reached
    #[error("Notification delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),

    /// The notification endpoint answered with an error status
    #[error("Notification rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// What happened to one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub stack_name: String,
    /// Failure details; `None` when the operation succeeded
    pub message: Option<String>,
    pub region: Option<String>,
    pub account: Option<String>,
    pub action: Action,
    /// Backend-style status label, e.g. `CREATE_COMPLETE`
    pub status: String,
    /// Credential profile the run used
    pub profile: Option<String>,
}

impl Notification {
    pub fn from_outcome(outcome: &OperationOutcome, profile: Option<&str>) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            stack_name: outcome.stack_name.clone(),
            message: outcome.failure_message(),
            region: non_empty(&outcome.region),
            account: non_empty(&outcome.account),
            action: outcome.action,
            status: outcome.status_label(),
            profile: profile.map(str::to_string),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.message.is_some()
    }

    /// Renders the notification as Slack mrkdwn text
    pub fn render_text(&self) -> String {
        let mut text = if self.is_failure() {
            format!(
                ":x: *{}* failed for stack *{}*",
                self.action, self.stack_name
            )
        } else {
            format!(
                ":white_check_mark: *{}* for stack *{}*",
                self.status, self.stack_name
            )
        };

        let context = [
            ("Account", self.account.as_deref()),
            ("Region", self.region.as_deref()),
            ("Profile", self.profile.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| format!("{}: `{}`", label, v)))
        .collect::<Vec<_>>();
        if !context.is_empty() {
            text.push('\n');
            text.push_str(&context.join(" | "));
        }

        if let Some(message) = &self.message {
            text.push('\n');
            text.push_str(message);
        }

        text
    }
}

/// Destination for operation notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers a notification
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// Sink that writes notifications to the tracing log
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        match &notification.message {
            Some(message) => error!(
                stack = %notification.stack_name,
                status = %notification.status,
                "{}",
                message
            ),
            None => info!(
                stack = %notification.stack_name,
                status = %notification.status,
                "{} for stack {}",
                notification.status,
                notification.stack_name
            ),
        }
        Ok(())
    }
}

/// Sink posting to a Slack incoming webhook
pub struct SlackWebhookSink {
    client: Client,
    webhook_url: String,
}

impl SlackWebhookSink {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self::with_client(webhook_url, Client::new())
    }

    pub fn with_client(webhook_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for SlackWebhookSink {
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        let payload = serde_json::json!({ "text": notification.render_text() });
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Picks the sink matching the configuration
///
/// Slack when a webhook is configured, the tracing log otherwise.
pub fn sink_from_config(config: &Config) -> Arc<dyn NotificationSink> {
    match &config.slack_webhook_url {
        Some(url) => Arc::new(SlackWebhookSink::new(url.clone())),
        None => Arc::new(TracingSink),
    }
}
