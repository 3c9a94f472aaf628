//! Async contracts for platform services used by the task store.
//!
//! # Responsibility
//! - Define the persistence and notification seams the store depends on.
//! - Provide the default key-value backed persistence adapter.
//!
//! # Invariants
//! - Gateway errors are values; the store decides how to degrade.

pub mod notification;
pub mod persistence;
