//! Service layer
//!
//! Services contain the business logic of a pipeline run. They drive one
//! operation at a time against the stack backend, classify what happened and
//! report it.
//!
//! All services are trait-based to enable testing and dependency injection.

mod executor;
mod notification;
mod outcome;

// Re-export traits
pub use executor::OperationExecutor;
pub use notification::NotificationSink;

// Re-export implementations
pub use executor::StandardOperationExecutor;
pub use notification::{
    Notification, SinkError, SlackWebhookSink, TracingSink, sink_from_config,
};
pub use outcome::{OutcomeCollector, classify_events};
