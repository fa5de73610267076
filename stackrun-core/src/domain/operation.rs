//! Operation domain types
//!
//! An operation is one lifecycle action (create, update or delete) against
//! one stack. Descriptors are built once per pipeline run from the resolved
//! definitions and never change afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::stack::StackIdentity;

/// Lifecycle action performed against a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    /// Backend status label of a successful run of this action
    pub fn complete_status(&self) -> String {
        format!("{}_COMPLETE", self)
    }

    /// Backend status label of a failed run of this action
    pub fn failed_status(&self) -> String {
        format!("{}_FAILED", self)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "CREATE"),
            Action::Update => write!(f, "UPDATE"),
            Action::Delete => write!(f, "DELETE"),
        }
    }
}

/// A parameter value supplied at run time instead of in the stack file
///
/// The value is redacted from `Debug` output so descriptors can be logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretOverride {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl SecretOverride {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parses a `NAME=VALUE` pair
    pub fn parse(pair: &str) -> Option<Self> {
        let (name, value) = pair.split_once('=')?;
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, value))
    }
}

impl std::fmt::Debug for SecretOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretOverride")
            .field("name", &self.name)
            .field("value", &"***")
            .finish()
    }
}

/// Everything needed to run one operation against one stack
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub action: Action,
    pub stack: StackIdentity,
    /// Path of the template defining the stack's resources
    pub template: PathBuf,
    pub parameters: BTreeMap<String, String>,
    pub secrets: Vec<SecretOverride>,
}

impl OperationDescriptor {
    /// Returns the first required field that is empty, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.stack.name.trim().is_empty() {
            return Some("stack name");
        }
        if self.stack.account.trim().is_empty() {
            return Some("Account");
        }
        if self.stack.region.trim().is_empty() {
            return Some("Region");
        }
        if self.template.as_os_str().is_empty() {
            return Some("Template");
        }
        None
    }

    /// Stack parameters with secret overrides applied
    pub fn effective_parameters(&self) -> BTreeMap<String, String> {
        let mut parameters = self.parameters.clone();
        for secret in &self.secrets {
            parameters.insert(secret.name.clone(), secret.value.clone());
        }
        parameters
    }
}

/// Per-attempt marker attached to every request of one operation
///
/// Tokens are built from the current UTC time plus a process-wide sequence
/// number, so two attempts started within the same microsecond still get
/// distinct tokens. Only `[A-Za-z0-9-]` survives sanitization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

static TOKEN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

const MAX_TOKEN_LEN: usize = 128;

impl CorrelationToken {
    /// Generates a fresh token for a new attempt
    pub fn generate() -> Self {
        let sequence = TOKEN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f");
        Self::sanitized(&format!("{}-{}", timestamp, sequence))
    }

    /// Builds a token from arbitrary text, replacing disallowed characters
    pub fn sanitized(raw: &str) -> Self {
        let token: String = raw
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .take(MAX_TOKEN_LEN)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
