//! Stack domain types

use serde::{Deserialize, Serialize};

/// Identity of a stack managed by the remote backend
///
/// A stack name is only unique within an account and region, so all three
/// travel together wherever a stack is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackIdentity {
    pub name: String,
    pub account: String,
    pub region: String,
}

impl StackIdentity {
    pub fn new(
        name: impl Into<String>,
        account: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            account: account.into(),
            region: region.into(),
        }
    }
}

impl std::fmt::Display for StackIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.account, self.region)
    }
}

/// Presence of a stack on the remote backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackPresence {
    Exists { stack_id: String },
    NotFound,
}

/// An entry in the remote event history of a stack
///
/// Events are produced by the backend as resources of the stack change
/// status. The correlation token is the one supplied with the request that
/// caused the change, when the backend recorded one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEvent {
    #[serde(default)]
    pub correlation_token: Option<String>,
    pub resource_id: String,
    pub status: String,
    #[serde(default)]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl StackEvent {
    /// Whether the event status carries the backend's failure marker
    pub fn is_failure(&self) -> bool {
        self.status.contains("FAILED")
    }
}
