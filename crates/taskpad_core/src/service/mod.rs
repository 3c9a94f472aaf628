//! Core use-case services.
//!
//! # Responsibility
//! - Own the task store and its startup wiring.
//! - Keep FFI/CLI layers decoupled from storage and notification details.

pub mod bootstrap;
pub mod task_store;
