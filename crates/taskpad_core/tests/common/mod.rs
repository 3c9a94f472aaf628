#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use taskpad_core::{
    KvSnapshotGateway, MemoryKvRepository, NotificationGateway, NotifyError, NotifyResult,
    PersistError, PersistResult, PersistenceGateway, ReminderHandle, ReminderRequest, RepoError,
    StoreConfig, Task, TaskStore,
};
use tokio::sync::oneshot;

/// Notification gateway that issues sequential handles and records calls.
#[derive(Default)]
pub struct RecordingNotifier {
    next: AtomicUsize,
    fail_schedule: AtomicBool,
    fail_cancel: AtomicBool,
    scheduled: Mutex<Vec<(ReminderRequest, ReminderHandle)>>,
    cancelled: Mutex<Vec<ReminderHandle>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_schedule(&self, fail: bool) {
        self.fail_schedule.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_cancel(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    pub fn scheduled(&self) -> Vec<(ReminderRequest, ReminderHandle)> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn scheduled_bodies(&self) -> Vec<String> {
        self.scheduled()
            .into_iter()
            .map(|(request, _)| request.body)
            .collect()
    }

    pub fn cancelled(&self) -> Vec<ReminderHandle> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingNotifier {
    async fn schedule(&self, request: ReminderRequest) -> NotifyResult<ReminderHandle> {
        if self.fail_schedule.load(Ordering::SeqCst) {
            return Err(NotifyError::PermissionDenied);
        }
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = ReminderHandle::new(format!("h-{n}"));
        self.scheduled
            .lock()
            .unwrap()
            .push((request, handle.clone()));
        Ok(handle)
    }

    async fn cancel(&self, handle: &ReminderHandle) -> NotifyResult<()> {
        self.cancelled.lock().unwrap().push(handle.clone());
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(NotifyError::Platform("cancel rejected".to_string()));
        }
        Ok(())
    }
}

/// Notification gateway whose schedule calls stay pending until released.
#[derive(Default)]
pub struct GatedNotifier {
    waiting: Mutex<VecDeque<(ReminderRequest, oneshot::Sender<ReminderHandle>)>>,
    cancelled: Mutex<Vec<ReminderHandle>>,
}

impl GatedNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.lock().unwrap().len()
    }

    /// Resolves the pending schedule call at `index` (in arrival order).
    pub fn release(&self, index: usize, handle: &str) -> ReminderRequest {
        let (request, sender) = self
            .waiting
            .lock()
            .unwrap()
            .remove(index)
            .expect("no pending schedule call at index");
        sender
            .send(ReminderHandle::new(handle))
            .expect("schedule caller went away");
        request
    }

    pub fn cancelled(&self) -> Vec<ReminderHandle> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for GatedNotifier {
    async fn schedule(&self, request: ReminderRequest) -> NotifyResult<ReminderHandle> {
        let (sender, receiver) = oneshot::channel();
        self.waiting.lock().unwrap().push_back((request, sender));
        receiver
            .await
            .map_err(|_| NotifyError::Platform("gate dropped".to_string()))
    }

    async fn cancel(&self, handle: &ReminderHandle) -> NotifyResult<()> {
        self.cancelled.lock().unwrap().push(handle.clone());
        Ok(())
    }
}

/// In-memory snapshot gateway that counts saves and can be made to fail.
pub struct FlakyPersistence {
    inner: KvSnapshotGateway<MemoryKvRepository>,
    fail_save: AtomicBool,
    saves: AtomicUsize,
}

impl FlakyPersistence {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: KvSnapshotGateway::new(MemoryKvRepository::new()),
            fail_save: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        })
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn stored(&self) -> Option<Vec<Task>> {
        self.inner.load().await.unwrap()
    }
}

#[async_trait]
impl PersistenceGateway for FlakyPersistence {
    async fn load(&self) -> PersistResult<Option<Vec<Task>>> {
        self.inner.load().await
    }

    async fn save(&self, tasks: &[Task]) -> PersistResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(PersistError::Repo(RepoError::LockPoisoned));
        }
        self.inner.save(tasks).await
    }
}

pub async fn store_with(
    persistence: Arc<FlakyPersistence>,
    notifier: Arc<dyn NotificationGateway>,
) -> TaskStore {
    TaskStore::init(persistence, notifier, StoreConfig::default()).await
}

pub fn assert_reminder_invariant(tasks: &[Task]) {
    for task in tasks {
        assert!(
            !(task.completed && task.reminder.is_some()),
            "completed task {} still carries reminder {:?}",
            task.id,
            task.reminder
        );
    }
}
