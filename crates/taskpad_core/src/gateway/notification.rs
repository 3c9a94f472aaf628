//! Reminder notification gateway.
//!
//! # Responsibility
//! - Schedule one fixed-delay reminder per request and return its handle.
//! - Cancel reminders by handle.
//!
//! # Invariants
//! - `cancel` is idempotent: unknown, fired or cancelled handles are `Ok`.
//! - Denied permission surfaces as `NotifyError::PermissionDenied` from
//!   `schedule`, never as a panic.

use crate::model::task::{ReminderHandle, TaskId};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Delay between scheduling a reminder and delivering it.
pub const DEFAULT_REMINDER_DELAY: Duration = Duration::from_secs(10);
/// Notification title used for every task reminder.
pub const DEFAULT_REMINDER_TITLE: &str = "Task reminder";

pub type NotifyResult<T> = Result<T, NotifyError>;

/// One reminder to be delivered after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub task_id: TaskId,
    pub title: String,
    /// Task text captured when the reminder was requested.
    pub body: String,
    pub delay: Duration,
}

/// Outcome of the platform permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
}

impl PermissionState {
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            Self::Granted
        } else {
            Self::Denied
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    PermissionDenied,
    Platform(String),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "notification permission not granted"),
            Self::Platform(message) => write!(f, "notification platform error: {message}"),
        }
    }
}

impl Error for NotifyError {}

/// Platform notification contract.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// One-time permission request and channel setup.
    async fn prepare(&self) -> NotifyResult<PermissionState> {
        Ok(PermissionState::Granted)
    }

    async fn schedule(&self, request: ReminderRequest) -> NotifyResult<ReminderHandle>;

    async fn cancel(&self, handle: &ReminderHandle) -> NotifyResult<()>;
}

/// Gateway for hosts that cannot deliver notifications at all.
///
/// Every schedule attempt reports `PermissionDenied`, so tasks simply carry
/// no reminder.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifications;

#[async_trait]
impl NotificationGateway for DisabledNotifications {
    async fn prepare(&self) -> NotifyResult<PermissionState> {
        Ok(PermissionState::Denied)
    }

    async fn schedule(&self, _request: ReminderRequest) -> NotifyResult<ReminderHandle> {
        Err(NotifyError::PermissionDenied)
    }

    async fn cancel(&self, _handle: &ReminderHandle) -> NotifyResult<()> {
        Ok(())
    }
}
