//! Pipeline runner
//!
//! Entry point of the engine: establishes the backend session once, wires the
//! executor and scheduler together and runs a resolved plan.

use async_trait::async_trait;
use stackrun_client::{HttpStackBackend, StackBackend};
use stackrun_core::definition::load_plan;
use stackrun_core::domain::operation::OperationDescriptor;
use stackrun_core::domain::outcome::{OperationOutcome, PipelineReport};
use stackrun_core::domain::pipeline::PipelinePlan;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::error::PipelineError;
use crate::scheduler::PipelineScheduler;
use crate::service::{
    NotificationSink, OperationExecutor, StandardOperationExecutor, sink_from_config,
};

/// Runs pipelines against one backend with one notification sink
pub struct PipelineRunner {
    config: Config,
    backend: Arc<dyn StackBackend>,
    sink: Arc<dyn NotificationSink>,
}

impl PipelineRunner {
    /// Creates a runner with explicit collaborators
    pub fn new(
        config: Config,
        backend: Arc<dyn StackBackend>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            backend,
            sink,
        }
    }

    /// Creates a runner talking HTTP to the configured backend
    ///
    /// The sink is Slack when a webhook is configured, the log otherwise.
    pub fn from_config(config: Config) -> Self {
        let backend = HttpStackBackend::new(config.backend_url.clone())
            .with_api_token(config.api_token.clone())
            .with_poll_interval(config.poll_interval);
        let sink = sink_from_config(&config);
        Self::new(config, Arc::new(backend), sink)
    }

    /// Loads both definition files and runs the resulting plan
    ///
    /// Definition problems are reported before anything touches the backend.
    pub async fn run_files(
        &self,
        stack_file: &Path,
        pipeline_file: &Path,
    ) -> Result<PipelineReport, PipelineError> {
        let plan = load_plan(stack_file, pipeline_file)?;
        self.run(&plan).await
    }

    /// Runs a resolved plan
    pub async fn run(&self, plan: &PipelinePlan) -> Result<PipelineReport, PipelineError> {
        if self.config.dry_run {
            info!(operations = plan.len(), "Dry run, no remote call will be made");
            return Ok(PipelineScheduler::new(Arc::new(NoopExecutor)).dry_run(plan));
        }

        if plan.is_empty() {
            info!("Pipeline has no operations");
            return Ok(PipelineScheduler::new(Arc::new(NoopExecutor))
                .run(plan)
                .await);
        }

        let session = self
            .backend
            .establish_session(self.config.profile.as_deref())
            .await
            .map_err(|e| {
                error!("Failed to establish session: {}", e);
                PipelineError::Authentication(e)
            })?;
        info!(
            principal = %session.principal(),
            profile = session.profile().unwrap_or("default"),
            "Session established"
        );

        let executor = StandardOperationExecutor::new(
            Arc::clone(&self.backend),
            Arc::new(session),
            Arc::clone(&self.sink),
            self.config.wait_timeout,
        );

        Ok(PipelineScheduler::new(Arc::new(executor))
            .with_max_workers(self.config.max_parallel)
            .run(plan)
            .await)
    }
}

/// Executor for runs that never execute anything
struct NoopExecutor;

#[async_trait]
impl OperationExecutor for NoopExecutor {
    async fn execute(&self, descriptor: &OperationDescriptor) -> OperationOutcome {
        OperationOutcome::skipped(descriptor)
    }
}
