//! Stackrun Core
//!
//! Core types and abstractions for the stackrun pipeline engine.
//!
//! This crate contains:
//! - Domain types: stacks, operations, correlation tokens, outcomes, plans
//! - DTOs: wire types exchanged with the stack backend
//! - Definitions: loading and validating stack and pipeline files

pub mod definition;
pub mod domain;
pub mod dto;
pub mod error;

pub use error::DefinitionError;
