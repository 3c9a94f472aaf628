//! In-process reminder scheduler backed by tokio timers.
//!
//! # Responsibility
//! - Implement `NotificationGateway` for hosts that deliver reminders from
//!   inside the core process (FFI host polling, desktop shells).
//! - Hand due reminders to a `ReminderSink`.
//!
//! # Invariants
//! - A reminder is delivered at most once.
//! - A cancelled reminder is never delivered.
//! - Timers run on the runtime handle given at construction, so callers may
//!   schedule from any executor.

use crate::gateway::notification::{
    NotificationGateway, NotifyError, NotifyResult, PermissionState, ReminderRequest,
};
use crate::model::task::{ReminderHandle, TaskId};
use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Reminder handed to a sink when its delay elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredReminder {
    pub handle: ReminderHandle,
    pub task_id: TaskId,
    pub title: String,
    pub body: String,
}

/// Receiver of due reminders.
pub trait ReminderSink: Send + Sync + 'static {
    fn deliver(&self, reminder: DeliveredReminder);
}

/// Sink that buffers delivered reminders until the host drains them.
#[derive(Debug, Default)]
pub struct QueueSink {
    queue: Mutex<Vec<DeliveredReminder>>,
}

impl QueueSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears all reminders delivered so far, oldest first.
    pub fn drain(&self) -> Vec<DeliveredReminder> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *queue)
    }
}

impl ReminderSink for QueueSink {
    fn deliver(&self, reminder: DeliveredReminder) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reminder);
    }
}

type PendingTimers = Arc<tokio::sync::Mutex<HashMap<ReminderHandle, JoinHandle<()>>>>;

/// Local `NotificationGateway` implementation.
pub struct LocalReminderScheduler<S: ReminderSink> {
    runtime: Handle,
    sink: Arc<S>,
    permission: PermissionState,
    pending: PendingTimers,
}

impl<S: ReminderSink> LocalReminderScheduler<S> {
    pub fn new(runtime: Handle, sink: Arc<S>, permission: PermissionState) -> Self {
        Self {
            runtime,
            sink,
            permission,
            pending: Arc::default(),
        }
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Number of reminders scheduled but not yet delivered or cancelled.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Aborts every outstanding timer and returns how many were aborted.
    ///
    /// Nothing is delivered after this returns. Later `schedule` calls still
    /// work.
    pub async fn shutdown(&self) -> usize {
        let mut pending = self.pending.lock().await;
        let count = pending.len();
        for (_, timer) in pending.drain() {
            timer.abort();
        }
        info!("event=reminder_shutdown module=notify status=ok aborted={count}");
        count
    }
}

#[async_trait]
impl<S: ReminderSink> NotificationGateway for LocalReminderScheduler<S> {
    async fn prepare(&self) -> NotifyResult<PermissionState> {
        info!(
            "event=reminder_prepare module=notify status=ok permission={}",
            self.permission.as_str()
        );
        Ok(self.permission)
    }

    async fn schedule(&self, request: ReminderRequest) -> NotifyResult<ReminderHandle> {
        if self.permission == PermissionState::Denied {
            return Err(NotifyError::PermissionDenied);
        }

        let handle = ReminderHandle::new(format!("reminder-{}", Uuid::new_v4()));
        let delay = request.delay;
        let delivered = DeliveredReminder {
            handle: handle.clone(),
            task_id: request.task_id,
            title: request.title,
            body: request.body,
        };

        // Why: the timer claims its entry under this same lock, so inserting
        // while holding it keeps a zero delay from firing before registration.
        let mut pending = self.pending.lock().await;
        let timer = self.runtime.spawn({
            let timers = Arc::clone(&self.pending);
            let sink = Arc::clone(&self.sink);
            async move {
                tokio::time::sleep(delay).await;
                if timers.lock().await.remove(&delivered.handle).is_some() {
                    debug!(
                        "event=reminder_fire module=notify status=ok task_id={}",
                        delivered.task_id
                    );
                    sink.deliver(delivered);
                }
            }
        });
        pending.insert(handle.clone(), timer);

        debug!(
            "event=reminder_schedule module=notify status=ok delay_ms={}",
            delay.as_millis()
        );
        Ok(handle)
    }

    async fn cancel(&self, handle: &ReminderHandle) -> NotifyResult<()> {
        if let Some(timer) = self.pending.lock().await.remove(handle) {
            timer.abort();
            debug!("event=reminder_cancel module=notify status=ok");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalReminderScheduler, QueueSink};
    use crate::gateway::notification::{
        NotificationGateway, NotifyError, PermissionState, ReminderRequest,
    };
    use crate::model::task::ReminderHandle;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::runtime::Handle;
    use uuid::Uuid;

    fn request(body: &str) -> ReminderRequest {
        ReminderRequest {
            task_id: Uuid::new_v4(),
            title: "Task reminder".to_string(),
            body: body.to_string(),
            delay: Duration::from_secs(10),
        }
    }

    fn scheduler(permission: PermissionState) -> LocalReminderScheduler<QueueSink> {
        LocalReminderScheduler::new(Handle::current(), Arc::new(QueueSink::new()), permission)
    }

    #[tokio::test(start_paused = true)]
    async fn reminder_is_delivered_once_after_delay() {
        let scheduler = scheduler(PermissionState::Granted);
        let handle = scheduler.schedule(request("stretch")).await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(scheduler.sink().drain().is_empty());

        tokio::time::sleep(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;
        let delivered = scheduler.sink().drain();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].handle, handle);
        assert_eq!(delivered[0].body, "stretch");
        assert_eq!(scheduler.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_reminder_is_never_delivered() {
        let scheduler = scheduler(PermissionState::Granted);
        let handle = scheduler.schedule(request("call mom")).await.unwrap();

        scheduler.cancel(&handle).await.unwrap();
        scheduler.cancel(&handle).await.unwrap();

        tokio::time::sleep(Duration::from_secs(20)).await;
        tokio::task::yield_now().await;
        assert!(scheduler.sink().drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_aborts_all_pending_reminders() {
        let scheduler = scheduler(PermissionState::Granted);
        scheduler.schedule(request("pay rent")).await.unwrap();
        scheduler.schedule(request("feed cat")).await.unwrap();
        assert_eq!(scheduler.pending_count().await, 2);

        assert_eq!(scheduler.shutdown().await, 2);
        assert_eq!(scheduler.pending_count().await, 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert!(scheduler.sink().drain().is_empty());
        assert_eq!(scheduler.shutdown().await, 0);
    }

    #[tokio::test]
    async fn cancel_unknown_handle_is_ok() {
        let scheduler = scheduler(PermissionState::Granted);
        scheduler
            .cancel(&ReminderHandle::new("never-issued"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn denied_permission_rejects_schedule() {
        let scheduler = scheduler(PermissionState::Denied);
        assert_eq!(scheduler.prepare().await.unwrap(), PermissionState::Denied);
        let err = scheduler.schedule(request("x")).await.unwrap_err();
        assert_eq!(err, NotifyError::PermissionDenied);
        assert_eq!(scheduler.pending_count().await, 0);
    }
}
