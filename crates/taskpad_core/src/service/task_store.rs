//! Task store: the ordered task list and its reminder side channel.
//!
//! # Responsibility
//! - Apply add/edit/delete/toggle/reprioritize operations to the task list.
//! - Keep scheduled reminders aligned with completion state.
//! - Persist the full snapshot after every applied mutation.
//!
//! # Invariants
//! - Insertion order is display order; nothing re-sorts the list.
//! - A task carries a reminder only while incomplete.
//! - Rejected operations change nothing, save nothing and call no gateway.
//! - Store operations never return errors; gateway failures are logged and
//!   the operation completes with an absent reminder or an unsaved snapshot.
//!
//! # Concurrency
//! The list lives behind an async mutex. Mutation, snapshot save and reminder
//! cancellation run with the lock held, so the saved snapshot always matches
//! memory. Reminder scheduling (`add`, `toggle_complete` back to incomplete)
//! is awaited with the lock released. Concurrent operations on one task
//! therefore resolve last-write-wins per field: whichever resumes last sets
//! the fields it touches. A resuming toggle that replaces a different live
//! reminder cancels the replaced one.

use crate::config::StoreConfig;
use crate::gateway::notification::{NotificationGateway, ReminderRequest};
use crate::gateway::persistence::PersistenceGateway;
use crate::model::task::{normalize_text, Priority, ReminderHandle, Task, TaskId};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Why an operation was a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    EmptyText,
    UnknownTask(TaskId),
    InvalidPriority(String),
}

impl RejectReason {
    /// Stable reason code for presentation envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyText => "empty_text",
            Self::UnknownTask(_) => "unknown_task",
            Self::InvalidPriority(_) => "invalid_priority",
        }
    }
}

/// Result of one store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T = ()> {
    Applied(T),
    Rejected(RejectReason),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectReason> {
        match self {
            Self::Applied(_) => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

/// Owned task list plus the gateways it keeps in sync.
pub struct TaskStore {
    tasks: Mutex<Vec<Task>>,
    persistence: Arc<dyn PersistenceGateway>,
    notifier: Arc<dyn NotificationGateway>,
    config: StoreConfig,
}

impl TaskStore {
    /// Builds a store from the last persisted snapshot.
    ///
    /// Missing or unreadable snapshots start an empty list; the failure is
    /// logged, never returned.
    pub async fn init(
        persistence: Arc<dyn PersistenceGateway>,
        notifier: Arc<dyn NotificationGateway>,
        config: StoreConfig,
    ) -> Self {
        let tasks = match persistence.load().await {
            Ok(Some(tasks)) => {
                info!(
                    "event=store_init module=store status=ok source=snapshot task_count={}",
                    tasks.len()
                );
                tasks
            }
            Ok(None) => {
                info!("event=store_init module=store status=ok source=empty task_count=0");
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "event=store_init module=store status=degraded error_code=snapshot_unreadable error={}",
                    err
                );
                Vec::new()
            }
        };

        Self {
            tasks: Mutex::new(tasks),
            persistence,
            notifier,
            config,
        }
    }

    /// Appends a new task and requests its reminder.
    ///
    /// Returns the new task ID. The task is visible only after the reminder
    /// request resolves.
    pub async fn add(&self, text: &str) -> Outcome<TaskId> {
        let Some(text) = normalize_text(text) else {
            return reject("add", RejectReason::EmptyText);
        };

        let id = Uuid::new_v4();
        let reminder = self.request_reminder(id, text.as_str()).await;

        let mut tasks = self.tasks.lock().await;
        tasks.push(Task {
            id,
            text,
            completed: false,
            priority: Priority::default(),
            reminder,
        });
        self.persist(&tasks, "add").await;
        Outcome::Applied(id)
    }

    /// Replaces task text only.
    ///
    /// The pending reminder keeps the text it was scheduled with.
    pub async fn edit(&self, id: TaskId, new_text: &str) -> Outcome {
        let Some(text) = normalize_text(new_text) else {
            return reject("edit", RejectReason::EmptyText);
        };

        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            return reject("edit", RejectReason::UnknownTask(id));
        };
        task.text = text;
        self.persist(&tasks, "edit").await;
        Outcome::Applied(())
    }

    /// Cancels the task's reminder, then removes the task.
    pub async fn delete(&self, id: TaskId) -> Outcome {
        let mut tasks = self.tasks.lock().await;
        let Some(index) = tasks.iter().position(|task| task.id == id) else {
            return reject("delete", RejectReason::UnknownTask(id));
        };

        if let Some(handle) = tasks[index].reminder.clone() {
            self.cancel_reminder(&handle, "delete").await;
        }
        tasks.remove(index);
        self.persist(&tasks, "delete").await;
        Outcome::Applied(())
    }

    /// Flips completion and realigns the reminder.
    ///
    /// Completing cancels the reminder immediately. Reopening schedules a
    /// fresh reminder for the text captured now and applies the change only
    /// once scheduling resolves; if the task is deleted meanwhile the fresh
    /// reminder is cancelled and the toggle is rejected.
    ///
    /// Returns the resulting `completed` value.
    pub async fn toggle_complete(&self, id: TaskId) -> Outcome<bool> {
        let captured_text = {
            let mut tasks = self.tasks.lock().await;
            let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
                return reject("toggle_complete", RejectReason::UnknownTask(id));
            };

            if !task.completed {
                if let Some(handle) = task.mark_completed() {
                    self.cancel_reminder(&handle, "toggle_complete").await;
                }
                self.persist(&tasks, "toggle_complete").await;
                return Outcome::Applied(true);
            }
            task.text.clone()
        };

        let reminder = self.request_reminder(id, captured_text.as_str()).await;

        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            if let Some(orphan) = reminder {
                self.cancel_reminder(&orphan, "toggle_complete").await;
            }
            return reject("toggle_complete", RejectReason::UnknownTask(id));
        };
        if let Some(replaced) = task.mark_incomplete(reminder) {
            self.cancel_reminder(&replaced, "toggle_complete").await;
        }
        self.persist(&tasks, "toggle_complete").await;
        Outcome::Applied(false)
    }

    /// Replaces task priority only.
    pub async fn set_priority(&self, id: TaskId, priority: Priority) -> Outcome {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            return reject("set_priority", RejectReason::UnknownTask(id));
        };
        task.priority = priority;
        self.persist(&tasks, "set_priority").await;
        Outcome::Applied(())
    }

    /// `set_priority` for untyped labels coming from presentation layers.
    pub async fn set_priority_label(&self, id: TaskId, label: &str) -> Outcome {
        match Priority::parse(label) {
            Some(priority) => self.set_priority(id, priority).await,
            None => reject(
                "set_priority",
                RejectReason::InvalidPriority(label.to_string()),
            ),
        }
    }

    /// Current ordered list.
    pub async fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    pub async fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks
            .lock()
            .await
            .iter()
            .find(|task| task.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn request_reminder(&self, task_id: TaskId, text: &str) -> Option<ReminderHandle> {
        let request = ReminderRequest {
            task_id,
            title: self.config.reminder_title.clone(),
            body: text.to_string(),
            delay: self.config.reminder_delay,
        };
        match self.notifier.schedule(request).await {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(
                    "event=reminder_request module=store status=error task_id={} error_code=reminder_schedule_failed error={}",
                    task_id, err
                );
                None
            }
        }
    }

    async fn cancel_reminder(&self, handle: &ReminderHandle, op: &'static str) {
        if let Err(err) = self.notifier.cancel(handle).await {
            warn!(
                "event=reminder_cancel module=store status=error op={} error_code=reminder_cancel_failed error={}",
                op, err
            );
        }
    }

    async fn persist(&self, tasks: &[Task], op: &'static str) {
        match self.persistence.save(tasks).await {
            Ok(()) => debug!(
                "event=snapshot_save module=store status=ok op={} task_count={}",
                op,
                tasks.len()
            ),
            Err(err) => warn!(
                "event=snapshot_save module=store status=error op={} error_code=snapshot_save_failed error={}",
                op, err
            ),
        }
    }
}

fn reject<T>(op: &'static str, reason: RejectReason) -> Outcome<T> {
    debug!(
        "event=store_op module=store status=rejected op={} reason={}",
        op,
        reason.code()
    );
    Outcome::Rejected(reason)
}
