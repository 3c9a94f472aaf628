//! Core domain logic for taskpad.
//! This crate is the single source of truth for task and reminder invariants.

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError, StoreConfig};
pub use gateway::notification::{
    DisabledNotifications, NotificationGateway, NotifyError, NotifyResult, PermissionState,
    ReminderRequest, DEFAULT_REMINDER_DELAY, DEFAULT_REMINDER_TITLE,
};
pub use gateway::persistence::{
    KvSnapshotGateway, PersistError, PersistResult, PersistenceGateway, DEFAULT_SNAPSHOT_KEY,
};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::task::{Priority, ReminderHandle, Task, TaskId, TaskValidationError};
pub use notify::scheduler::{DeliveredReminder, LocalReminderScheduler, QueueSink, ReminderSink};
pub use repo::kv_repo::{KvRepository, MemoryKvRepository, RepoError, RepoResult, SqliteKvRepository};
pub use service::bootstrap::{open_persistence, open_store};
pub use service::task_store::{Outcome, RejectReason, TaskStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
