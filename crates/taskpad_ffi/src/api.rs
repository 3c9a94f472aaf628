//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the task store operations to Dart via FRB.
//! - Translate store outcomes into simple response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Task IDs cross the boundary as hyphenated UUID strings.
//! - Priorities cross the boundary as `high|medium|low`.

use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use taskpad_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_store,
    ping as ping_inner, AppConfig, LocalReminderScheduler, Outcome, PermissionState, QueueSink,
    RejectReason, Task, TaskId, TaskStore,
};
use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

const REMINDER_THREAD_NAME: &str = "taskpad-reminders";

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the rendered task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// `high|medium|low`.
    pub priority: String,
    pub has_reminder: bool,
}

/// Result envelope for task mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// `false` when the operation was a no-op.
    pub ok: bool,
    /// Affected task ID.
    pub task_id: Option<String>,
    /// Resulting completion flag (toggle only).
    pub completed: Option<bool>,
    /// Stable rejection code when `ok == false`.
    pub reason: Option<String>,
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task_id: TaskId, completed: Option<bool>) -> Self {
        Self {
            ok: true,
            task_id: Some(task_id.to_string()),
            completed,
            reason: None,
            message: message.into(),
        }
    }

    fn rejected(op: &str, reason: &RejectReason) -> Self {
        let message = match reason {
            RejectReason::EmptyText => format!("{op} ignored: text is empty."),
            RejectReason::UnknownTask(id) => format!("{op} ignored: task {id} not found."),
            RejectReason::InvalidPriority(value) => {
                format!("{op} ignored: unsupported priority `{value}`.")
            }
        };
        Self {
            ok: false,
            task_id: match reason {
                RejectReason::UnknownTask(id) => Some(id.to_string()),
                _ => None,
            },
            completed: None,
            reason: Some(reason.code().to_string()),
            message,
        }
    }

    fn invalid_id(op: &str, raw: &str) -> Self {
        Self {
            ok: false,
            task_id: None,
            completed: None,
            reason: Some("invalid_task_id".to_string()),
            message: format!("{op} ignored: `{raw}` is not a task id."),
        }
    }
}

/// Reminder delivered by the in-process scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredReminder {
    pub task_id: String,
    pub title: String,
    pub body: String,
}

/// Opaque application handle owning the task store.
///
/// The host keeps one instance for the app lifetime and passes it to every
/// screen; there is no process-global store.
#[flutter_rust_bridge::frb(opaque)]
pub struct TaskpadApp {
    store: TaskStore,
    sink: Arc<QueueSink>,
    notifier: Arc<LocalReminderScheduler<QueueSink>>,
    runtime: Option<Runtime>,
}

impl TaskpadApp {
    /// Opens the store at `db_path` (empty string: `TASKPAD_DB_PATH` or the
    /// temp-dir default).
    ///
    /// `notifications_permitted` is the outcome of the host's permission
    /// prompt. When `false`, tasks carry no reminders.
    ///
    /// # FFI contract
    /// - Async call; opens SQLite and loads the last snapshot.
    /// - An unreadable database degrades to an in-memory list.
    /// - Returns an error only when config or the timer thread cannot start.
    pub async fn open(db_path: String, notifications_permitted: bool) -> Result<Self, String> {
        let mut config = AppConfig::from_env().map_err(|err| err.to_string())?;
        let trimmed = db_path.trim();
        if !trimmed.is_empty() {
            config.db_path = PathBuf::from(trimmed);
        }
        let permission = PermissionState::from_granted(
            notifications_permitted && config.notifications_enabled,
        );

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(REMINDER_THREAD_NAME)
            .enable_time()
            .build()
            .map_err(|err| format!("failed to start reminder runtime: {err}"))?;
        let sink = Arc::new(QueueSink::new());
        let notifier = Arc::new(LocalReminderScheduler::new(
            runtime.handle().clone(),
            Arc::clone(&sink),
            permission,
        ));

        let store = open_store(&config, notifier.clone()).await;
        info!(
            "event=ffi_open module=ffi status=ok permission={}",
            permission.as_str()
        );

        Ok(Self {
            store,
            sink,
            notifier,
            runtime: Some(runtime),
        })
    }

    /// Appends a task; `ok == false` for blank text.
    pub async fn add_task(&self, text: String) -> TaskActionResponse {
        match self.store.add(text.as_str()).await {
            Outcome::Applied(id) => TaskActionResponse::success("Task added.", id, Some(false)),
            Outcome::Rejected(reason) => TaskActionResponse::rejected("add_task", &reason),
        }
    }

    pub async fn edit_task(&self, task_id: String, text: String) -> TaskActionResponse {
        let Some(id) = parse_task_id(&task_id) else {
            return TaskActionResponse::invalid_id("edit_task", &task_id);
        };
        respond(
            "edit_task",
            "Task updated.",
            id,
            self.store.edit(id, text.as_str()).await,
        )
    }

    pub async fn delete_task(&self, task_id: String) -> TaskActionResponse {
        let Some(id) = parse_task_id(&task_id) else {
            return TaskActionResponse::invalid_id("delete_task", &task_id);
        };
        respond(
            "delete_task",
            "Task deleted.",
            id,
            self.store.delete(id).await,
        )
    }

    /// Flips completion; `completed` carries the new value.
    pub async fn toggle_task(&self, task_id: String) -> TaskActionResponse {
        let Some(id) = parse_task_id(&task_id) else {
            return TaskActionResponse::invalid_id("toggle_task", &task_id);
        };
        match self.store.toggle_complete(id).await {
            Outcome::Applied(true) => TaskActionResponse::success("Task completed.", id, Some(true)),
            Outcome::Applied(false) => {
                TaskActionResponse::success("Task reopened.", id, Some(false))
            }
            Outcome::Rejected(reason) => TaskActionResponse::rejected("toggle_task", &reason),
        }
    }

    pub async fn set_task_priority(&self, task_id: String, priority: String) -> TaskActionResponse {
        let Some(id) = parse_task_id(&task_id) else {
            return TaskActionResponse::invalid_id("set_task_priority", &task_id);
        };
        respond(
            "set_task_priority",
            "Priority updated.",
            id,
            self.store.set_priority_label(id, priority.as_str()).await,
        )
    }

    /// Current list in display order.
    pub async fn list_tasks(&self) -> Vec<TaskItem> {
        self.store
            .snapshot()
            .await
            .iter()
            .map(to_task_item)
            .collect()
    }

    /// Aborts every pending reminder timer; returns how many were aborted.
    ///
    /// # FFI contract
    /// - Async call; the host calls it before releasing the handle.
    /// - Stored tasks keep their reminder handles, and the next `open`
    ///   schedules nothing on their behalf.
    pub async fn close(&self) -> usize {
        let aborted = self.notifier.shutdown().await;
        info!("event=ffi_close module=ffi status=ok aborted={aborted}");
        aborted
    }

    /// Drains reminders that came due since the last call.
    ///
    /// # FFI contract
    /// - Sync call, non-blocking.
    #[flutter_rust_bridge::frb(sync)]
    pub fn take_fired_reminders(&self) -> Vec<FiredReminder> {
        self.sink
            .drain()
            .into_iter()
            .map(|reminder| FiredReminder {
                task_id: reminder.task_id.to_string(),
                title: reminder.title,
                body: reminder.body,
            })
            .collect()
    }
}

impl Drop for TaskpadApp {
    fn drop(&mut self) {
        // Why: hosts may drop the handle from inside an async executor, where
        // a blocking runtime shutdown would panic.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn respond(op: &str, message: &str, id: TaskId, outcome: Outcome) -> TaskActionResponse {
    match outcome {
        Outcome::Applied(()) => TaskActionResponse::success(message, id, None),
        Outcome::Rejected(reason) => TaskActionResponse::rejected(op, &reason),
    }
}

fn parse_task_id(raw: &str) -> Option<TaskId> {
    Uuid::parse_str(raw.trim()).ok()
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.to_string(),
        text: task.text.clone(),
        completed: task.completed,
        priority: task.priority.as_str().to_string(),
        has_reminder: task.reminder.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::{core_version, init_logging, ping, TaskpadApp};
    use tokio::runtime::Runtime;

    fn open_app(rt: &Runtime, dir: &tempfile::TempDir, permitted: bool) -> TaskpadApp {
        let db_path = dir.path().join("ffi.sqlite3");
        rt.block_on(TaskpadApp::open(
            db_path.to_str().expect("utf-8 temp path").to_string(),
            permitted,
        ))
        .expect("app should open")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn add_list_toggle_and_delete_round_trip() {
        let rt = Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let app = open_app(&rt, &dir, true);

        let added = rt.block_on(app.add_task("  Buy milk  ".to_string()));
        assert!(added.ok, "{}", added.message);
        let id = added.task_id.clone().unwrap();

        let items = rt.block_on(app.list_tasks());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Buy milk");
        assert_eq!(items[0].priority, "medium");
        assert!(items[0].has_reminder);

        let toggled = rt.block_on(app.toggle_task(id.clone()));
        assert_eq!(toggled.completed, Some(true));
        let items = rt.block_on(app.list_tasks());
        assert!(items[0].completed);
        assert!(!items[0].has_reminder);

        let deleted = rt.block_on(app.delete_task(id));
        assert!(deleted.ok);
        assert!(rt.block_on(app.list_tasks()).is_empty());
    }

    #[test]
    fn rejected_operations_report_reason_codes() {
        let rt = Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let app = open_app(&rt, &dir, false);

        let blank = rt.block_on(app.add_task("   ".to_string()));
        assert!(!blank.ok);
        assert_eq!(blank.reason.as_deref(), Some("empty_text"));

        let bad_id = rt.block_on(app.toggle_task("not-a-uuid".to_string()));
        assert_eq!(bad_id.reason.as_deref(), Some("invalid_task_id"));

        let added = rt.block_on(app.add_task("quiet".to_string()));
        let id = added.task_id.unwrap();
        assert!(!rt.block_on(app.list_tasks())[0].has_reminder);

        let bad_priority = rt.block_on(app.set_task_priority(id.clone(), "urgent".to_string()));
        assert_eq!(bad_priority.reason.as_deref(), Some("invalid_priority"));

        let missing = rt.block_on(app.edit_task(
            "11111111-2222-4333-8444-555555555555".to_string(),
            "text".to_string(),
        ));
        assert_eq!(missing.reason.as_deref(), Some("unknown_task"));

        let ok = rt.block_on(app.set_task_priority(id, "High".to_string()));
        assert!(ok.ok);
        assert_eq!(rt.block_on(app.list_tasks())[0].priority, "high");
    }

    #[test]
    fn close_aborts_pending_reminders() {
        let rt = Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let app = open_app(&rt, &dir, true);

        assert!(rt.block_on(app.add_task("stretch".to_string())).ok);
        assert!(rt.block_on(app.add_task("drink water".to_string())).ok);

        assert_eq!(rt.block_on(app.close()), 2);
        assert_eq!(rt.block_on(app.close()), 0);
        assert!(app.take_fired_reminders().is_empty());
        assert_eq!(rt.block_on(app.list_tasks()).len(), 2);
    }

    #[test]
    fn reopened_app_sees_persisted_tasks() {
        let rt = Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let first = open_app(&rt, &dir, false);
        let added = rt.block_on(first.add_task("persist me".to_string()));
        assert!(added.ok);
        drop(first);

        let second = open_app(&rt, &dir, false);
        let items = rt.block_on(second.list_tasks());
        assert_eq!(items.len(), 1);
        assert_eq!(Some(items[0].id.clone()), added.task_id);
        assert!(second.take_fired_reminders().is_empty());
    }
}
