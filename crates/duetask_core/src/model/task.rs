//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record exchanged over the API.
//! - Define create and sparse-update payloads.
//! - Provide the due-state predicate used by the watcher.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is non-empty after trimming.
//! - `notified` goes false -> true once, only for a due, uncompleted task.

use crate::model::due::{deserialize_due_at, deserialize_due_patch};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier assigned by the store on creation.
pub type TaskId = Uuid;

/// Validation failures for task writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is missing or whitespace-only.
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title is required and cannot be blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// Where a task sits in the due-notification lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    /// No due time, due in the future, or completed before firing.
    Pending,
    /// Due time reached, not completed, not yet notified.
    Due,
    /// The watcher already fired for this task.
    Notified,
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub important: bool,
    /// Unix epoch milliseconds; `None` means no due time.
    #[serde(default, deserialize_with = "deserialize_due_at")]
    pub due_at: Option<i64>,
    #[serde(default)]
    pub notified: bool,
    /// Unix epoch milliseconds. Drives default ordering (newest first).
    pub created_at: i64,
    /// Unix epoch milliseconds of the last successful write.
    #[serde(default)]
    pub updated_at: i64,
}

impl Task {
    /// Builds a fresh task from a create payload with a generated stable ID.
    ///
    /// The title is stored trimmed. Call [`Task::validate`] before persisting.
    pub fn from_new(input: &NewTask, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            completed: input.completed,
            important: input.important,
            due_at: input.due_at,
            notified: input.notified,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Checks write-time invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)
    }

    /// Classifies this task against `now_ms`.
    ///
    /// A completed task that never fired stays `Pending` forever; completion
    /// does not reset an earlier `Notified`.
    pub fn due_state(&self, now_ms: i64) -> DueState {
        if self.notified {
            return DueState::Notified;
        }
        match self.due_at {
            Some(due_at) if !self.completed && due_at <= now_ms => DueState::Due,
            _ => DueState::Pending,
        }
    }

    /// Shorthand for `due_state(now_ms) == DueState::Due`.
    pub fn is_due(&self, now_ms: i64) -> bool {
        self.due_state(now_ms) == DueState::Due
    }
}

/// Create payload. Flags default to `false` when omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub important: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_due_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_at: Option<i64>,
    #[serde(default)]
    pub notified: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_due_at(mut self, due_at: Option<i64>) -> Self {
        self.due_at = due_at;
        self
    }
}

/// Sparse update payload. Absent fields are left untouched.
///
/// `due_at` is doubly optional: `None` leaves the due time alone,
/// `Some(None)` clears it, `Some(Some(ms))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,
    #[serde(
        default,
        deserialize_with = "deserialize_due_patch",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_at: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified: Option<bool>,
}

impl TaskPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            ..Self::default()
        }
    }

    pub fn important(value: bool) -> Self {
        Self {
            important: Some(value),
            ..Self::default()
        }
    }

    pub fn notified() -> Self {
        Self {
            notified: Some(true),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.completed.is_none()
            && self.important.is_none()
            && self.due_at.is_none()
            && self.notified.is_none()
    }

    /// Rejects a present-but-blank title.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        match self.title.as_deref() {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }

    /// Copies every present field onto `task`. Titles are trimmed.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(important) = self.important {
            task.important = important;
        }
        if let Some(due_at) = self.due_at {
            task.due_at = due_at;
        }
        if let Some(notified) = self.notified {
            task.notified = notified;
        }
    }
}

fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    Ok(())
}
