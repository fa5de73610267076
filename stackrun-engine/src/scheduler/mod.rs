//! Scheduler layer
//!
//! Decides in which order, and with how much concurrency, the operations of
//! a resolved plan are handed to the executor, then aggregates their
//! outcomes into a single report.

pub mod pipeline;

pub use pipeline::PipelineScheduler;
