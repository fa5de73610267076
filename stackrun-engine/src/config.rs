//! Engine configuration
//!
//! Defines all configurable parameters for a pipeline run including the
//! backend connection, notification target and wait bounds.

use std::time::Duration;

/// Engine configuration
///
/// Wait bounds are configurable since remote operations range from seconds
/// (parameter tweaks) to the better part of an hour (databases, CDNs).
#[derive(Debug, Clone)]
pub struct Config {
    /// Stack backend base URL (e.g., "http://localhost:8080")
    pub backend_url: String,

    /// Credential presented to the backend when establishing the session
    pub api_token: Option<String>,

    /// Named credential profile to use for the session
    pub profile: Option<String>,

    /// Slack incoming webhook for operation notifications
    pub slack_webhook_url: Option<String>,

    /// Maximum time to wait for one operation to reach a terminal state
    pub wait_timeout: Duration,

    /// How often the backend is polled while waiting
    pub poll_interval: Duration,

    /// Upper bound on operations running at once in parallel mode
    ///
    /// `None` starts every operation of the plan at once.
    pub max_parallel: Option<usize>,

    /// Resolve and report the plan without contacting the backend
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(backend_url: String) -> Self {
        Self {
            backend_url,
            api_token: None,
            profile: None,
            slack_webhook_url: None,
            wait_timeout: Duration::from_secs(3600),
            poll_interval: Duration::from_secs(15),
            max_parallel: None,
            dry_run: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - STACKRUN_BACKEND_URL (required)
    /// - STACKRUN_API_TOKEN (optional)
    /// - STACKRUN_PROFILE (optional)
    /// - STACKRUN_SLACK_WEBHOOK_URL (optional)
    /// - STACKRUN_WAIT_TIMEOUT (optional, seconds, default: 3600)
    /// - STACKRUN_POLL_INTERVAL (optional, seconds, default: 15)
    /// - STACKRUN_MAX_PARALLEL (optional, default: unbounded)
    ///
    /// A numeric variable that is set but does not parse is an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let backend_url = std::env::var("STACKRUN_BACKEND_URL")
            .map_err(|_| anyhow::anyhow!("STACKRUN_BACKEND_URL environment variable not set"))?;

        let wait_timeout = parse_seconds(
            "STACKRUN_WAIT_TIMEOUT",
            non_empty_var("STACKRUN_WAIT_TIMEOUT"),
            Duration::from_secs(3600),
        )?;
        let poll_interval = parse_seconds(
            "STACKRUN_POLL_INTERVAL",
            non_empty_var("STACKRUN_POLL_INTERVAL"),
            Duration::from_secs(15),
        )?;
        let max_parallel =
            parse_count("STACKRUN_MAX_PARALLEL", non_empty_var("STACKRUN_MAX_PARALLEL"))?;

        Ok(Self {
            backend_url,
            api_token: non_empty_var("STACKRUN_API_TOKEN"),
            profile: non_empty_var("STACKRUN_PROFILE"),
            slack_webhook_url: non_empty_var("STACKRUN_SLACK_WEBHOOK_URL"),
            wait_timeout,
            poll_interval,
            max_parallel,
            dry_run: false,
        })
    }

    /// Sets the credential profile
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        if profile.is_some() {
            self.profile = profile;
        }
        self
    }

    /// Sets the Slack webhook
    pub fn with_slack_webhook(mut self, url: Option<String>) -> Self {
        if url.is_some() {
            self.slack_webhook_url = url;
        }
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.backend_url.is_empty() {
            anyhow::bail!("backend_url cannot be empty");
        }

        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            anyhow::bail!("backend_url must start with http:// or https://");
        }

        if let Some(url) = &self.slack_webhook_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!("slack_webhook_url must be an http(s) URL");
            }
        }

        if self.wait_timeout.is_zero() {
            anyhow::bail!("wait_timeout must be greater than 0");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_parallel == Some(0) {
            anyhow::bail!("max_parallel must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8080".to_string())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_seconds(name: &str, raw: Option<String>, default: Duration) -> anyhow::Result<Duration> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| {
            anyhow::anyhow!("{} must be a whole number of seconds, got '{}'", name, raw)
        }),
    }
}

fn parse_count(name: &str, raw: Option<String>) -> anyhow::Result<Option<usize>> {
    raw.map(|raw| {
        raw.trim()
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("{} must be a positive integer, got '{}'", name, raw))
    })
    .transpose()
}
