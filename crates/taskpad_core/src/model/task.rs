//! Task domain model.
//!
//! # Responsibility
//! - Define the single record rendered by the to-do list.
//! - Own the completion/reminder pairing rules for one task.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `text` is never empty after trimming.
//! - `reminder` is `Some` only while `completed == false`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one task.
pub type TaskId = Uuid;

/// Display priority of a task.
///
/// Priority never affects list order; it is a label only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Stable string id used by presentation layers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parses a case-insensitive priority label.
    ///
    /// Returns `None` for anything outside `high|medium|low`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to an outstanding scheduled reminder.
///
/// Issued by a notification gateway; core code only stores and returns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderHandle(String);

impl ReminderHandle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ReminderHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Validation errors for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NilId,
    EmptyText,
    ReminderOnCompletedTask,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "task id must not be nil"),
            Self::EmptyText => write!(f, "task text must not be empty"),
            Self::ReminderOnCompletedTask => {
                write!(f, "completed task must not carry a reminder")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// One to-do entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub reminder: Option<ReminderHandle>,
}

/// Unvalidated wire shape; every decoded task passes through `validate()`.
#[derive(Deserialize)]
struct TaskRecord {
    id: TaskId,
    text: String,
    completed: bool,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    reminder: Option<ReminderHandle>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(value: TaskRecord) -> Result<Self, Self::Error> {
        let task = Self {
            id: value.id,
            text: value.text,
            completed: value.completed,
            priority: value.priority,
            reminder: value.reminder,
        };
        task.validate()?;
        Ok(task)
    }
}

impl Task {
    /// Creates an incomplete, medium-priority task with a generated ID.
    ///
    /// Text is trimmed.
    ///
    /// # Errors
    /// - `EmptyText` when `text` is blank.
    pub fn new(
        text: impl AsRef<str>,
        reminder: Option<ReminderHandle>,
    ) -> Result<Self, TaskValidationError> {
        Self::with_id(Uuid::new_v4(), text, reminder)
    }

    /// Creates a task with a caller-provided ID.
    ///
    /// # Errors
    /// - `NilId` when `id` is nil.
    /// - `EmptyText` when `text` is blank.
    pub fn with_id(
        id: TaskId,
        text: impl AsRef<str>,
        reminder: Option<ReminderHandle>,
    ) -> Result<Self, TaskValidationError> {
        let task = Self {
            id,
            text: normalize_text(text.as_ref()).ok_or(TaskValidationError::EmptyText)?,
            completed: false,
            priority: Priority::default(),
            reminder,
        };
        task.validate()?;
        Ok(task)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        if self.text.trim().is_empty() {
            return Err(TaskValidationError::EmptyText);
        }
        if self.completed && self.reminder.is_some() {
            return Err(TaskValidationError::ReminderOnCompletedTask);
        }
        Ok(())
    }

    /// Marks the task completed and hands back the reminder to cancel.
    pub fn mark_completed(&mut self) -> Option<ReminderHandle> {
        self.completed = true;
        self.reminder.take()
    }

    /// Marks the task incomplete with a freshly acquired reminder.
    ///
    /// Returns the previous handle when it differs from the new one, so the
    /// caller can cancel it.
    pub fn mark_incomplete(&mut self, reminder: Option<ReminderHandle>) -> Option<ReminderHandle> {
        self.completed = false;
        let previous = std::mem::replace(&mut self.reminder, reminder);
        match (&previous, &self.reminder) {
            (Some(old), Some(new)) if old == new => None,
            _ => previous,
        }
    }
}

/// Trims user input; returns `None` when nothing is left.
pub fn normalize_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
