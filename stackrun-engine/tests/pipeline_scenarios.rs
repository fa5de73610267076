//! End-to-end pipeline runs against an in-memory backend

use async_trait::async_trait;
use stackrun_client::{ClientError, Result as ClientResult, Session, StackBackend, WaitOutcome};
use stackrun_core::domain::operation::Action;
use stackrun_core::domain::outcome::{FailureKind, FinalState};
use stackrun_core::domain::stack::{StackEvent, StackIdentity, StackPresence};
use stackrun_core::dto::stack::SubmitStack;
use stackrun_engine::service::{Notification, NotificationSink, SinkError};
use stackrun_engine::{Config, PipelineError, PipelineRunner};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct InMemoryBackend {
    existing: HashSet<String>,
    fail_submit: HashSet<String>,
    deny_session: bool,
    calls: Mutex<Vec<String>>,
    submitted: Mutex<Vec<SubmitStack>>,
}

impl InMemoryBackend {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StackBackend for InMemoryBackend {
    async fn establish_session(&self, profile: Option<&str>) -> ClientResult<Session> {
        self.record("session");
        if self.deny_session {
            return Err(ClientError::api_error(401, "invalid token"));
        }
        Ok(Session::new(profile.map(str::to_string), "deployer", None))
    }

    async fn describe_exists(
        &self,
        _session: &Session,
        stack: &StackIdentity,
    ) -> ClientResult<StackPresence> {
        self.record(&format!("describe:{}", stack.name));
        if self.existing.contains(&stack.name) {
            Ok(StackPresence::Exists {
                stack_id: format!("arn:{}", stack.name),
            })
        } else {
            Ok(StackPresence::NotFound)
        }
    }

    async fn submit(
        &self,
        _session: &Session,
        stack: &StackIdentity,
        request: &SubmitStack,
    ) -> ClientResult<()> {
        self.record(&format!("submit:{}", stack.name));
        if self.fail_submit.contains(&stack.name) {
            return Err(ClientError::Rejected("stack is locked".to_string()));
        }
        self.submitted.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn wait_for_terminal(
        &self,
        _session: &Session,
        _stack: &StackIdentity,
        action: Action,
        _timeout: Duration,
    ) -> ClientResult<WaitOutcome> {
        Ok(WaitOutcome::Terminal {
            status: action.complete_status(),
        })
    }

    async fn fetch_events(
        &self,
        _session: &Session,
        stack: &StackIdentity,
        _stack_id: Option<&str>,
    ) -> ClientResult<Vec<StackEvent>> {
        Ok(self
            .submitted
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.stack_name == stack.name)
            .map(|request| StackEvent {
                correlation_token: Some(request.client_request_token.to_string()),
                resource_id: stack.name.clone(),
                status: request.action.complete_status(),
                status_reason: None,
                timestamp: None,
            })
            .collect())
    }

    async fn disable_deletion_safeguard(
        &self,
        _session: &Session,
        stack: &StackIdentity,
    ) -> ClientResult<()> {
        self.record(&format!("disable_safeguard:{}", stack.name));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        self.received.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

const TEMPLATE: &str = "Resources:\n  Service:\n    Type: Compute::Service\n";

const STACKS: &str = r#"
WebApp:
  Account: 111
  Region: us-east-1
  Template: web.yaml
  Parameters: {}
Network:
  Account: 111
  Region: us-east-1
  Template: web.yaml
  Parameters:
    Cidr: 10.0.0.0/16
Database:
  Account: 111
  Region: eu-west-1
  Template: web.yaml
  Parameters: {}
Cache:
  Account: 222
  Region: eu-west-1
  Template: web.yaml
  Parameters: {}
"#;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("web.yaml"), TEMPLATE).unwrap();
        std::fs::write(dir.path().join("stacks.yaml"), STACKS).unwrap();
        Self { dir }
    }

    fn stack_file(&self) -> PathBuf {
        self.dir.path().join("stacks.yaml")
    }

    fn pipeline(&self, content: &str) -> PathBuf {
        let path = self.dir.path().join("pipeline.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }
}

fn runner(backend: Arc<InMemoryBackend>, sink: Arc<RecordingSink>) -> PipelineRunner {
    let mut config = Config::default();
    config.wait_timeout = Duration::from_secs(5);
    PipelineRunner::new(config, backend, sink)
}

async fn run(
    backend: Arc<InMemoryBackend>,
    sink: Arc<RecordingSink>,
    stack_file: &Path,
    pipeline_file: &Path,
) -> Result<stackrun_core::domain::outcome::PipelineReport, PipelineError> {
    runner(backend, sink).run_files(stack_file, pipeline_file).await
}

#[tokio::test]
async fn test_delete_existing_stack_completes() {
    let ws = Workspace::new();
    let pipeline = ws.pipeline("pipeline:\n  delete:\n    - stack_name: WebApp\n");
    let backend = Arc::new(InMemoryBackend {
        existing: HashSet::from(["WebApp".to_string()]),
        ..Default::default()
    });
    let sink = Arc::new(RecordingSink::default());

    let report = run(backend.clone(), sink.clone(), &ws.stack_file(), &pipeline)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.stack_name, "WebApp");
    assert_eq!(outcome.state, FinalState::Completed);
    assert!(outcome.reasons.is_empty());
    assert_eq!(outcome.account, "111");
    assert!(!report.is_failed());

    assert_eq!(
        backend.calls(),
        vec![
            "session",
            "describe:WebApp",
            "disable_safeguard:WebApp",
            "submit:WebApp"
        ]
    );
    assert_eq!(sink.received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_parallel_pipeline_with_rejected_delete() {
    let ws = Workspace::new();
    let pipeline = ws.pipeline(
        r#"
pipeline:
  pipeline_type: parallel
  create:
    - stack_name: Network
    - stack_name: Database
    - stack_name: Cache
  delete:
    - stack_name: WebApp
"#,
    );
    let backend = Arc::new(InMemoryBackend {
        existing: HashSet::from(["WebApp".to_string()]),
        fail_submit: HashSet::from(["WebApp".to_string()]),
        ..Default::default()
    });
    let sink = Arc::new(RecordingSink::default());

    let report = run(backend, sink.clone(), &ws.stack_file(), &pipeline)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.count(FinalState::Completed), 3);
    assert_eq!(report.count(FinalState::Failed), 1);
    assert!(report.is_failed());

    let failed = report.outcomes.iter().find(|o| o.is_failed()).unwrap();
    assert_eq!(failed.stack_name, "WebApp");
    assert_eq!(failed.action, Action::Delete);
    assert_eq!(failed.reasons[0].kind, FailureKind::Rejected);

    // One notification per operation, successes included
    assert_eq!(sink.received.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn test_sequential_secrets_reach_the_backend() {
    let ws = Workspace::new();
    let pipeline = ws.pipeline(
        r#"
pipeline:
  create:
    - stack_name: Network
      secrets:
        - Name: Cidr
          Value: 10.1.0.0/16
        - Name: Password
          Value: hunter2
  update:
    - stack_name: Database
"#,
    );
    let backend = Arc::new(InMemoryBackend::default());

    let report = run(backend.clone(), Arc::default(), &ws.stack_file(), &pipeline)
        .await
        .unwrap();

    assert_eq!(report.count(FinalState::Completed), 2);
    let submitted = backend.submitted.lock().unwrap();
    assert_eq!(submitted[0].stack_name, "Network");
    assert_eq!(submitted[0].parameters["Cidr"], "10.1.0.0/16");
    assert_eq!(submitted[0].parameters["Password"], "hunter2");
    assert_eq!(submitted[1].action, Action::Update);
}

#[tokio::test]
async fn test_unknown_stack_fails_before_any_remote_call() {
    let ws = Workspace::new();
    let pipeline = ws.pipeline(
        "pipeline:\n  create:\n    - stack_name: Network\n    - stack_name: Orphan\n",
    );
    let backend = Arc::new(InMemoryBackend::default());

    let err = run(backend.clone(), Arc::default(), &ws.stack_file(), &pipeline)
        .await
        .unwrap_err();

    assert!(err.is_definition());
    assert!(err.to_string().contains("Orphan"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_session_failure_aborts_run() {
    let ws = Workspace::new();
    let pipeline = ws.pipeline("pipeline:\n  create:\n    - stack_name: Network\n");
    let backend = Arc::new(InMemoryBackend {
        deny_session: true,
        ..Default::default()
    });

    let err = run(backend.clone(), Arc::default(), &ws.stack_file(), &pipeline)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Authentication(_)));
    assert_eq!(backend.calls(), vec!["session"]);
}

#[tokio::test]
async fn test_dry_run_makes_no_remote_call() {
    let ws = Workspace::new();
    let pipeline = ws.pipeline(
        "pipeline:\n  pipeline_type: parallel\n  create:\n    - stack_name: Network\n  delete:\n    - stack_name: WebApp\n",
    );
    let backend = Arc::new(InMemoryBackend::default());
    let mut config = Config::default();
    config.dry_run = true;

    let report = PipelineRunner::new(config, backend.clone(), Arc::new(RecordingSink::default()))
        .run_files(&ws.stack_file(), &pipeline)
        .await
        .unwrap();

    assert_eq!(report.count(FinalState::Skipped), 2);
    assert!(!report.is_failed());
    assert!(backend.calls().is_empty());
}
