//! Data Transfer Objects for the stack backend API
//!
//! DTOs are the JSON shapes exchanged with the remote stack-management
//! service. They are kept apart from the domain types so the wire format
//! can evolve without touching the engine.

pub mod stack;
