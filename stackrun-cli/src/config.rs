//! Configuration module
//!
//! Global flags shared by every command, and how they become the engine
//! configuration. Every flag can also be set through its environment variable.

use anyhow::{Context, Result};
use clap::Args;
use stackrun_engine::Config;
use std::time::Duration;
use tracing::debug;

/// Flags accepted by every command
#[derive(Args)]
pub struct GlobalArgs {
    /// Stack backend URL
    #[arg(
        long,
        global = true,
        env = "STACKRUN_BACKEND_URL",
        default_value = "http://localhost:8080"
    )]
    pub backend_url: String,

    /// Token presented to the backend
    #[arg(long, global = true, env = "STACKRUN_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Credential profile used for the session
    #[arg(long, global = true, env = "STACKRUN_PROFILE")]
    pub profile: Option<String>,

    /// Slack incoming webhook for notifications
    #[arg(
        long,
        global = true,
        env = "STACKRUN_SLACK_WEBHOOK_URL",
        hide_env_values = true
    )]
    pub slack_webhook_url: Option<String>,

    /// Maximum seconds to wait for each operation
    #[arg(long, global = true, env = "STACKRUN_WAIT_TIMEOUT")]
    pub wait_timeout: Option<u64>,

    /// Seconds between status polls
    #[arg(long, global = true, env = "STACKRUN_POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Maximum operations running at once in parallel mode
    #[arg(long, global = true, env = "STACKRUN_MAX_PARALLEL")]
    pub max_parallel: Option<usize>,

    /// Resolve and validate definitions without contacting the backend
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl GlobalArgs {
    /// Builds the engine configuration from the flags
    ///
    /// Starts from the environment (or the defaults when no backend URL is
    /// exported) and lets explicit flags win. A malformed variable is an
    /// error, never a silent default.
    pub fn into_config(self) -> Result<Config> {
        let mut config = if std::env::var_os("STACKRUN_BACKEND_URL").is_some() {
            Config::from_env().context("Invalid environment configuration")?
        } else {
            debug!("STACKRUN_BACKEND_URL not set, using default configuration");
            Config::default()
        };

        config.backend_url = self.backend_url;
        if self.api_token.is_some() {
            config.api_token = self.api_token;
        }
        if let Some(seconds) = self.wait_timeout {
            config.wait_timeout = Duration::from_secs(seconds);
        }
        if let Some(seconds) = self.poll_interval {
            config.poll_interval = Duration::from_secs(seconds);
        }
        if self.max_parallel.is_some() {
            config.max_parallel = self.max_parallel;
        }
        config.dry_run = self.dry_run;

        let config = config
            .with_profile(self.profile)
            .with_slack_webhook(self.slack_webhook_url);

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}
