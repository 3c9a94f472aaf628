//! Notification gateway implementations.

pub mod scheduler;
