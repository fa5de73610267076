//! Pipeline scheduler
//!
//! Runs the operations of a plan either one at a time (create, update, then
//! delete) or all at once with one task per operation. Every operation of the
//! plan ends up in the report exactly once.

use chrono::Utc;
use stackrun_core::domain::operation::{Action, OperationDescriptor};
use stackrun_core::domain::outcome::{
    FailureKind, FailureReason, FinalState, OperationOutcome, PipelineReport,
};
use stackrun_core::domain::pipeline::{PipelineMode, PipelinePlan};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::service::OperationExecutor;

/// Drives a plan through an [`OperationExecutor`]
pub struct PipelineScheduler {
    executor: Arc<dyn OperationExecutor>,
    max_workers: Option<usize>,
}

impl PipelineScheduler {
    pub fn new(executor: Arc<dyn OperationExecutor>) -> Self {
        Self {
            executor,
            max_workers: None,
        }
    }

    /// Caps the number of operations running at once in parallel mode
    ///
    /// `None` runs every operation at once.
    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Runs every operation of the plan and aggregates the outcomes
    pub async fn run(&self, plan: &PipelinePlan) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            mode = %plan.mode,
            operations = plan.len(),
            "Starting pipeline"
        );

        let outcomes = match plan.mode {
            PipelineMode::Sequential => self.run_sequential(plan).await,
            PipelineMode::Parallel => self.run_parallel(plan).await,
        };

        let report = PipelineReport {
            run_id,
            mode: plan.mode,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };

        if report.is_failed() {
            error!(
                run_id = %run_id,
                failed = report.count(FinalState::Failed),
                "Pipeline finished with failures"
            );
        } else {
            info!(run_id = %run_id, "Pipeline finished");
        }

        report
    }

    /// Reports every operation as skipped without executing anything
    pub fn dry_run(&self, plan: &PipelinePlan) -> PipelineReport {
        let started_at = Utc::now();
        let outcomes = plan
            .operations
            .iter()
            .map(|descriptor| {
                info!(
                    stack = %descriptor.stack,
                    action = %descriptor.action,
                    "Dry run, skipping operation"
                );
                OperationOutcome::skipped(descriptor)
            })
            .collect();

        PipelineReport {
            run_id: Uuid::new_v4(),
            mode: plan.mode,
            outcomes,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn run_sequential(&self, plan: &PipelinePlan) -> Vec<OperationOutcome> {
        let mut outcomes = Vec::with_capacity(plan.len());

        for action in [Action::Create, Action::Update, Action::Delete] {
            for descriptor in plan.group(action) {
                debug!(stack = %descriptor.stack.name, action = %action, "Running operation");
                // A failure never halts the remaining operations
                outcomes.push(self.executor.execute(descriptor).await);
            }
        }

        outcomes
    }

    async fn run_parallel(&self, plan: &PipelinePlan) -> Vec<OperationOutcome> {
        if plan.is_empty() {
            return Vec::new();
        }

        let workers = self
            .max_workers
            .map_or(plan.len(), |max| max.clamp(1, plan.len()));
        debug!(workers, "Starting worker pool");
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut handles = Vec::with_capacity(plan.len());

        for descriptor in &plan.operations {
            let started_at = Utc::now();
            let handle = match semaphore.clone().acquire_owned().await {
                Ok(permit) => Some(self.spawn_operation_task(descriptor.clone(), permit)),
                Err(e) => {
                    error!(stack = %descriptor.stack.name, "Worker pool closed: {}", e);
                    None
                }
            };
            handles.push((descriptor, started_at, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (descriptor, started_at, handle) in handles {
            let result = match handle {
                Some(handle) => handle.await.map_err(|e| e.to_string()),
                None => Err("worker pool closed".to_string()),
            };

            let outcome = result.unwrap_or_else(|e| {
                error!(stack = %descriptor.stack.name, "Operation task failed: {}", e);
                OperationOutcome::failed(
                    descriptor,
                    None,
                    FailureReason::new(
                        FailureKind::Backend,
                        descriptor.stack.name.clone(),
                        format!("Worker task failed: {}", e),
                    ),
                    started_at,
                )
            });
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Spawns a task executing a single operation
    fn spawn_operation_task(
        &self,
        descriptor: OperationDescriptor,
        permit: tokio::sync::OwnedSemaphorePermit,
    ) -> tokio::task::JoinHandle<OperationOutcome> {
        let executor = Arc::clone(&self.executor);

        tokio::spawn(async move {
            // Held until the operation finishes
            let _permit = permit;
            executor.execute(&descriptor).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stackrun_core::domain::stack::StackIdentity;
    use std::collections::{BTreeMap, HashSet};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Executor that records the order it was called in
    #[derive(Default)]
    struct FakeExecutor {
        failing: HashSet<String>,
        panicking: HashSet<String>,
        delay: Option<Duration>,
        calls: Mutex<Vec<(Action, String)>>,
        running: AtomicUsize,
        max_running: AtomicUsize,
    }

    #[async_trait]
    impl OperationExecutor for FakeExecutor {
        async fn execute(&self, descriptor: &OperationDescriptor) -> OperationOutcome {
            let started_at = Utc::now();
            let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now_running, Ordering::SeqCst);
            self.calls
                .lock()
                .unwrap()
                .push((descriptor.action, descriptor.stack.name.clone()));

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.running.fetch_sub(1, Ordering::SeqCst);

            if self.panicking.contains(&descriptor.stack.name) {
                panic!("executor blew up");
            }
            if self.failing.contains(&descriptor.stack.name) {
                return OperationOutcome::failed(
                    descriptor,
                    None,
                    FailureReason::new(FailureKind::Rejected, &descriptor.stack.name, "rejected"),
                    started_at,
                );
            }
            OperationOutcome::classified(
                descriptor,
                stackrun_core::domain::operation::CorrelationToken::generate(),
                vec![],
                started_at,
            )
        }
    }

    fn op(action: Action, name: &str) -> OperationDescriptor {
        OperationDescriptor {
            action,
            stack: StackIdentity::new(name, "111", "us-east-1"),
            template: PathBuf::from(format!("{}.yaml", name)),
            parameters: BTreeMap::new(),
            secrets: Vec::new(),
        }
    }

    fn plan(mode: PipelineMode) -> PipelinePlan {
        PipelinePlan {
            mode,
            operations: vec![
                op(Action::Create, "Network"),
                op(Action::Create, "Database"),
                op(Action::Update, "WebApp"),
                op(Action::Delete, "Legacy"),
            ],
        }
    }

    #[tokio::test]
    async fn test_sequential_runs_groups_in_order() {
        let executor = Arc::new(FakeExecutor::default());
        let scheduler = PipelineScheduler::new(executor.clone());

        // Declared out of group order; the scheduler still runs creates first
        let plan = PipelinePlan {
            mode: PipelineMode::Sequential,
            operations: vec![
                op(Action::Delete, "Legacy"),
                op(Action::Create, "Network"),
                op(Action::Update, "WebApp"),
                op(Action::Create, "Database"),
            ],
        };
        let report = scheduler.run(&plan).await;

        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.mode, PipelineMode::Sequential);
        assert_eq!(
            *executor.calls.lock().unwrap(),
            vec![
                (Action::Create, "Network".to_string()),
                (Action::Create, "Database".to_string()),
                (Action::Update, "WebApp".to_string()),
                (Action::Delete, "Legacy".to_string()),
            ]
        );

        let last_create = report
            .outcomes
            .iter()
            .filter(|o| o.action == Action::Create)
            .map(|o| o.started_at)
            .max()
            .unwrap();
        let first_delete = report
            .outcomes
            .iter()
            .filter(|o| o.action == Action::Delete)
            .map(|o| o.started_at)
            .min()
            .unwrap();
        assert!(last_create <= first_delete);
        assert_eq!(executor.max_running.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sequential_continues_after_failure() {
        let executor = Arc::new(FakeExecutor {
            failing: HashSet::from(["Network".to_string()]),
            ..Default::default()
        });
        let scheduler = PipelineScheduler::new(executor.clone());

        let report = scheduler.run(&plan(PipelineMode::Sequential)).await;

        assert_eq!(report.outcomes.len(), 4);
        assert!(report.is_failed());
        assert_eq!(report.count(FinalState::Failed), 1);
        assert_eq!(report.count(FinalState::Completed), 3);
        assert_eq!(executor.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_parallel_runs_everything_concurrently() {
        let executor = Arc::new(FakeExecutor {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let scheduler = PipelineScheduler::new(executor.clone());

        let report = scheduler.run(&plan(PipelineMode::Parallel)).await;

        assert_eq!(report.outcomes.len(), 4);
        assert!(!report.is_failed());
        assert!(executor.max_running.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_parallel_respects_worker_cap() {
        let executor = Arc::new(FakeExecutor {
            delay: Some(Duration::from_millis(30)),
            ..Default::default()
        });
        let scheduler = PipelineScheduler::new(executor.clone()).with_max_workers(Some(2));

        let report = scheduler.run(&plan(PipelineMode::Parallel)).await;

        assert_eq!(report.outcomes.len(), 4);
        assert!(!report.is_failed());
        assert!(executor.max_running.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_parallel_failure_does_not_stop_others() {
        let executor = Arc::new(FakeExecutor {
            failing: HashSet::from(["Legacy".to_string()]),
            ..Default::default()
        });
        let scheduler = PipelineScheduler::new(executor);

        let report = scheduler.run(&plan(PipelineMode::Parallel)).await;

        assert_eq!(report.outcomes.len(), 4);
        assert!(report.is_failed());
        assert_eq!(report.count(FinalState::Completed), 3);
        let failed: Vec<_> = report.outcomes.iter().filter(|o| o.is_failed()).collect();
        assert_eq!(failed[0].stack_name, "Legacy");
    }

    #[tokio::test]
    async fn test_parallel_panic_is_recorded_as_failure() {
        let executor = Arc::new(FakeExecutor {
            panicking: HashSet::from(["Database".to_string()]),
            ..Default::default()
        });
        let scheduler = PipelineScheduler::new(executor);

        let report = scheduler.run(&plan(PipelineMode::Parallel)).await;

        assert_eq!(report.outcomes.len(), 4);
        let names: HashSet<_> = report.outcomes.iter().map(|o| o.stack_name.as_str()).collect();
        assert_eq!(names.len(), 4);

        let panicked = report
            .outcomes
            .iter()
            .find(|o| o.stack_name == "Database")
            .unwrap();
        assert_eq!(panicked.state, FinalState::Failed);
        assert!(panicked.reasons[0].reason.contains("Worker task failed"));
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let scheduler = PipelineScheduler::new(Arc::new(FakeExecutor::default()));

        for mode in [PipelineMode::Sequential, PipelineMode::Parallel] {
            let report = scheduler
                .run(&PipelinePlan {
                    mode,
                    operations: Vec::new(),
                })
                .await;
            assert!(report.outcomes.is_empty());
            assert!(!report.is_failed());
        }
    }

    #[test]
    fn test_dry_run_skips_everything() {
        let executor = Arc::new(FakeExecutor::default());
        let scheduler = PipelineScheduler::new(executor.clone());

        let report = scheduler.dry_run(&plan(PipelineMode::Parallel));

        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.count(FinalState::Skipped), 4);
        assert!(!report.is_failed());
        assert!(executor.calls.lock().unwrap().is_empty());
    }
}
