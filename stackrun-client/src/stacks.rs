//! Stack-related API endpoints

use async_trait::async_trait;
use stackrun_core::domain::operation::Action;
use stackrun_core::domain::stack::{StackEvent, StackIdentity, StackPresence};
use stackrun_core::dto::stack::{
    DeletionProtection, SessionInfo, StackDescription, StackEvents, StackStatus, SubmitStack,
};
use std::time::Duration;
use tracing::debug;

use crate::HttpStackBackend;
use crate::backend::{StackBackend, WaitOutcome};
use crate::error::Result;
use crate::session::Session;

impl HttpStackBackend {
    // =============================================================================
    // Session
    // =============================================================================

    /// Ask the backend who the configured credentials belong to
    pub async fn session_info(&self, profile: Option<&str>) -> Result<SessionInfo> {
        let bootstrap = Session::new(profile.map(str::to_string), "", self.api_token.clone());
        let url = format!("{}/api/session", self.base_url);
        let response = self
            .authorized(self.client.get(&url), &bootstrap)
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Stacks
    // =============================================================================

    fn stack_url(&self, stack: &StackIdentity) -> String {
        format!(
            "{}/api/accounts/{}/regions/{}/stacks/{}",
            self.base_url, stack.account, stack.region, stack.name
        )
    }

    /// Get the description of a stack
    pub async fn describe_stack(
        &self,
        session: &Session,
        stack: &StackIdentity,
    ) -> Result<StackDescription> {
        let url = self.stack_url(stack);
        let response = self
            .authorized(self.client.get(&url), session)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the current status of a stack
    pub async fn stack_status(&self, session: &Session, stack: &StackIdentity) -> Result<StackStatus> {
        let url = format!("{}/status", self.stack_url(stack));
        let response = self
            .authorized(self.client.get(&url), session)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Start a lifecycle operation on a stack
    pub async fn submit_operation(
        &self,
        session: &Session,
        stack: &StackIdentity,
        request: &SubmitStack,
    ) -> Result<()> {
        let url = format!("{}/operations", self.stack_url(stack));
        let response = self
            .authorized(self.client.post(&url), session)
            .json(request)
            .send()
            .await?;

        self.handle_empty_response(response)
            .await
            .map_err(|e| e.into_rejection())
    }

    /// Get the event history of a stack
    pub async fn stack_events(&self, session: &Session, stack: &StackIdentity) -> Result<StackEvents> {
        let url = format!("{}/events", self.stack_url(stack));
        let response = self
            .authorized(self.client.get(&url), session)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the event history of a stack by its unique id
    ///
    /// Still answers after the stack was deleted.
    pub async fn stack_events_by_id(
        &self,
        session: &Session,
        stack: &StackIdentity,
        stack_id: &str,
    ) -> Result<StackEvents> {
        let url = format!(
            "{}/api/accounts/{}/regions/{}/events",
            self.base_url, stack.account, stack.region
        );
        let response = self
            .authorized(self.client.get(&url), session)
            .query(&[("stack_id", stack_id)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Enable or disable deletion protection of a stack
    pub async fn set_deletion_protection(
        &self,
        session: &Session,
        stack: &StackIdentity,
        enabled: bool,
    ) -> Result<()> {
        let url = format!("{}/deletion-protection", self.stack_url(stack));
        let response = self
            .authorized(self.client.put(&url), session)
            .json(&DeletionProtection { enabled })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Poll the stack status until it is terminal
    async fn poll_until_terminal(
        &self,
        session: &Session,
        stack: &StackIdentity,
        action: Action,
    ) -> Result<WaitOutcome> {
        let mut ticker = tokio::time::interval(self.poll_interval);

        loop {
            ticker.tick().await;

            match self.stack_status(session, stack).await {
                Ok(status) if status.is_terminal() => {
                    return Ok(WaitOutcome::Terminal {
                        status: status.status,
                    });
                }
                Ok(status) => {
                    debug!(stack = %stack.name, status = %status.status, "Stack not settled yet");
                }
                // A deleted stack disappears from the backend
                Err(e) if action == Action::Delete && e.is_not_found() => {
                    return Ok(WaitOutcome::Terminal {
                        status: action.complete_status(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl StackBackend for HttpStackBackend {
    async fn establish_session(&self, profile: Option<&str>) -> Result<Session> {
        let info = self.session_info(profile).await?;
        Ok(Session::new(
            profile.map(str::to_string),
            info.principal,
            self.api_token.clone(),
        ))
    }

    async fn describe_exists(
        &self,
        session: &Session,
        stack: &StackIdentity,
    ) -> Result<StackPresence> {
        match self.describe_stack(session, stack).await {
            Ok(description) => Ok(StackPresence::Exists {
                stack_id: description.stack_id,
            }),
            Err(e) if e.is_not_found() => Ok(StackPresence::NotFound),
            Err(e) => Err(e),
        }
    }

    async fn submit(
        &self,
        session: &Session,
        stack: &StackIdentity,
        request: &SubmitStack,
    ) -> Result<()> {
        self.submit_operation(session, stack, request).await
    }

    async fn wait_for_terminal(
        &self,
        session: &Session,
        stack: &StackIdentity,
        action: Action,
        timeout: Duration,
    ) -> Result<WaitOutcome> {
        match tokio::time::timeout(timeout, self.poll_until_terminal(session, stack, action)).await {
            Ok(outcome) => outcome,
            Err(_) => Ok(WaitOutcome::TimedOut),
        }
    }

    async fn fetch_events(
        &self,
        session: &Session,
        stack: &StackIdentity,
        stack_id: Option<&str>,
    ) -> Result<Vec<StackEvent>> {
        let events = match stack_id {
            Some(id) => self.stack_events_by_id(session, stack, id).await?,
            None => self.stack_events(session, stack).await?,
        };
        Ok(events.events)
    }

    async fn disable_deletion_safeguard(
        &self,
        session: &Session,
        stack: &StackIdentity,
    ) -> Result<()> {
        self.set_deletion_protection(session, stack, false).await
    }
}
