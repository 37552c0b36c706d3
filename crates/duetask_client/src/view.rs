//! Pure presentation over client state.
//!
//! # Responsibility
//! - Filter tasks (`all` / `active` / `completed` / `important`).
//! - Render task lines, list summaries and active due alerts as text.
//! - Track the single in-progress edit draft.
//!
//! # Invariants
//! - Rendering never mutates client state.
//! - At most one task is in edit mode; beginning another edit drops the
//!   previous draft unsaved.

use crate::error::ClientError;
use crate::state::TaskState;
use crate::watcher::ActiveAlert;
use duetask_core::{format_due, Task, TaskId, TaskPatch};
use std::fmt::Write as _;
use std::str::FromStr;

pub const EMPTY_LIST_MESSAGE: &str = "You're all caught up!";
const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
    Important,
}

impl Filter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
            Self::Important => task.important,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Important => "important",
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            "important" | "starred" => Ok(Self::Important),
            other => Err(format!(
                "unknown filter `{other}`; expected all|active|completed|important"
            )),
        }
    }
}

pub fn filter_tasks(tasks: &[Task], filter: Filter) -> Vec<&Task> {
    tasks.iter().filter(|task| filter.matches(task)).collect()
}

pub fn short_id(id: TaskId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

/// One line: `<short id> [x] * title  (due ...)`.
pub fn render_task_line(task: &Task, now_ms: i64) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let star = if task.important { "*" } else { " " };
    let mut line = format!("{} {check} {star} {}", short_id(task.id), task.title);

    if let Some(due_at) = task.due_at {
        let overdue = !task.completed && due_at <= now_ms;
        let marker = if overdue { "overdue" } else { "due" };
        let _ = write!(line, "  ({marker} {})", format_due(due_at));
    }
    line
}

/// Full list view with header, alerts and the filtered tasks.
pub fn render_list(state: &TaskState, filter: Filter, alerts: &[ActiveAlert], now_ms: i64) -> String {
    let tasks = state.tasks();
    let completed = tasks.iter().filter(|task| task.completed).count();
    let mut out = format!(
        "My Tasks [{}] {} active, {} completed\n",
        filter.label(),
        tasks.len() - completed,
        completed
    );

    out.push_str(&render_alerts(alerts));

    let visible = filter_tasks(tasks, filter);
    if visible.is_empty() {
        out.push_str(EMPTY_LIST_MESSAGE);
        out.push('\n');
        return out;
    }
    for task in visible {
        out.push_str(&render_task_line(task, now_ms));
        out.push('\n');
    }
    out
}

pub fn render_alerts(alerts: &[ActiveAlert]) -> String {
    alerts
        .iter()
        .map(|alert| format!("! {}\n", alert.message))
        .collect()
}

/// The draft held while a task is in edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub task_id: TaskId,
    pub title: String,
    pub due_at: Option<i64>,
}

#[derive(Debug, Default)]
pub struct EditSession {
    draft: Option<EditDraft>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters edit mode for `task`, returning any draft it displaced.
    pub fn begin(&mut self, task: &Task) -> Option<EditDraft> {
        self.draft.replace(EditDraft {
            task_id: task.id,
            title: task.title.clone(),
            due_at: task.due_at,
        })
    }

    pub fn current(&self) -> Option<&EditDraft> {
        self.draft.as_ref()
    }

    pub fn is_editing(&self, id: TaskId) -> bool {
        self.draft.as_ref().is_some_and(|draft| draft.task_id == id)
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), ClientError> {
        self.draft_mut()?.title = title.to_string();
        Ok(())
    }

    pub fn set_due(&mut self, due_at: Option<i64>) -> Result<(), ClientError> {
        self.draft_mut()?.due_at = due_at;
        Ok(())
    }

    pub fn cancel(&mut self) -> Option<EditDraft> {
        self.draft.take()
    }

    /// Builds the save payload (title and due time only).
    ///
    /// The draft stays open so a failed save can be retried; clear it with
    /// [`EditSession::cancel`] once the update succeeds.
    pub fn save_patch(&self) -> Result<(TaskId, TaskPatch), ClientError> {
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| ClientError::Validation("no task is being edited".to_string()))?;
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(ClientError::Validation(
                "task title cannot be blank".to_string(),
            ));
        }
        Ok((
            draft.task_id,
            TaskPatch {
                title: Some(title.to_string()),
                due_at: Some(draft.due_at),
                ..TaskPatch::default()
            },
        ))
    }

    fn draft_mut(&mut self) -> Result<&mut EditDraft, ClientError> {
        self.draft
            .as_mut()
            .ok_or_else(|| ClientError::Validation("no task is being edited".to_string()))
    }
}
