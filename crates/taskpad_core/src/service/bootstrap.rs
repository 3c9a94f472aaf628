//! Startup wiring for hosts.
//!
//! # Responsibility
//! - Open the on-device database and build the snapshot gateway.
//! - Run the notification gateway's one-time setup.
//! - Hand back a ready `TaskStore`.
//!
//! # Invariants
//! - Startup never fails: an unusable database degrades to an in-memory
//!   store and a failed permission prompt degrades to no reminders.

use crate::config::AppConfig;
use crate::db::open_db;
use crate::gateway::notification::NotificationGateway;
use crate::gateway::persistence::{KvSnapshotGateway, PersistenceGateway};
use crate::repo::kv_repo::{MemoryKvRepository, SqliteKvRepository};
use crate::service::task_store::TaskStore;
use log::{info, warn};
use std::sync::Arc;

/// Builds the persistence gateway for `config.db_path`.
pub fn open_persistence(config: &AppConfig) -> Arc<dyn PersistenceGateway> {
    match open_db(&config.db_path) {
        Ok(conn) => Arc::new(KvSnapshotGateway::with_key(
            SqliteKvRepository::new(conn),
            config.snapshot_key.clone(),
        )),
        Err(err) => {
            warn!(
                "event=persistence_open module=bootstrap status=degraded fallback=memory error_code=db_unavailable error={}",
                err
            );
            Arc::new(KvSnapshotGateway::with_key(
                MemoryKvRepository::new(),
                config.snapshot_key.clone(),
            ))
        }
    }
}

/// Opens persistence, prepares notifications and loads the store.
pub async fn open_store(config: &AppConfig, notifier: Arc<dyn NotificationGateway>) -> TaskStore {
    let persistence = open_persistence(config);

    match notifier.prepare().await {
        Ok(permission) => info!(
            "event=notification_prepare module=bootstrap status=ok permission={}",
            permission.as_str()
        ),
        Err(err) => warn!(
            "event=notification_prepare module=bootstrap status=error error_code=notification_setup_failed error={}",
            err
        ),
    }

    TaskStore::init(persistence, notifier, config.store_config()).await
}
