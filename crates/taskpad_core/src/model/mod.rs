//! Domain model for the to-do list.
//!
//! # Responsibility
//! - Define canonical data structures used by the task store.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion removes the record; there are no tombstones.

pub mod task;
