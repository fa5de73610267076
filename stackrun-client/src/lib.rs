//! Stackrun backend client
//!
//! A type-safe client for the remote stack-management API, plus the
//! [`StackBackend`] trait the engine is written against.
//!
//! # Example
//!
//! ```no_run
//! use stackrun_client::{HttpStackBackend, StackBackend};
//! use stackrun_core::domain::stack::StackIdentity;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), stackrun_client::ClientError> {
//!     let backend = HttpStackBackend::new("http://localhost:8080");
//!     let session = backend.establish_session(Some("prod")).await?;
//!
//!     let stack = StackIdentity::new("WebApp", "111", "us-east-1");
//!     let presence = backend.describe_exists(&session, &stack).await?;
//!     println!("WebApp: {:?}", presence);
//!     Ok(())
//! }
//! ```

mod backend;
pub mod error;
mod session;
mod stacks;

// Re-export commonly used types
pub use backend::{StackBackend, WaitOutcome};
pub use error::{ClientError, Result};
pub use session::Session;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Header carrying the credential profile name
pub const PROFILE_HEADER: &str = "x-stackrun-profile";

/// HTTP client for the stack backend API
///
/// Endpoints are grouped as:
/// - Session check
/// - Stack description and status
/// - Operation submission
/// - Event history
/// - Deletion protection
#[derive(Debug, Clone)]
pub struct HttpStackBackend {
    /// Base URL of the backend (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Credential presented when establishing a session
    api_token: Option<String>,
    /// Delay between status polls while waiting for a terminal state
    poll_interval: Duration,
}

impl HttpStackBackend {
    /// Create a new backend client
    ///
    /// # Example
    /// ```
    /// use stackrun_client::HttpStackBackend;
    ///
    /// let backend = HttpStackBackend::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new backend client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            api_token: None,
            poll_interval: Duration::from_secs(15),
        }
    }

    /// Set the API token used to establish sessions
    pub fn with_api_token(mut self, api_token: Option<String>) -> Self {
        self.api_token = api_token;
        self
    }

    /// Set the status polling interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Attach the session's credentials to a request
    fn authorized(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        let builder = match session.api_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        match session.profile() {
            Some(profile) => builder.header(PROFILE_HEADER, profile),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
