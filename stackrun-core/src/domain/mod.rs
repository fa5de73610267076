//! Core domain types
//!
//! This module contains the core domain structures shared by the engine,
//! the backend client and the CLI: stack identities, operation descriptors,
//! correlation tokens, outcomes and the pipeline plan.

pub mod operation;
pub mod outcome;
pub mod pipeline;
pub mod stack;
