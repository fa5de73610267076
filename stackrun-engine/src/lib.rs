//! Stackrun engine
//!
//! Executes pipelines of infrastructure stack operations against a stack
//! backend and reports one outcome per operation.
//!
//! Architecture:
//! - Configuration: Load settings from environment or defaults
//! - Services: Business logic (operation execution, outcome classification, notifications)
//! - Scheduler: Sequential or parallel execution of a resolved plan
//! - Runner: Session setup and wiring, the entry point used by the CLI
//!
//! Fatal problems (bad definitions, no session) surface as [`PipelineError`]
//! before any operation starts. Everything else is scoped to one operation
//! and recorded in the [`PipelineReport`](stackrun_core::domain::outcome::PipelineReport).

pub mod config;
pub mod error;
pub mod runner;
pub mod scheduler;
pub mod service;

pub use config::Config;
pub use error::PipelineError;
pub use runner::PipelineRunner;
pub use scheduler::PipelineScheduler;
