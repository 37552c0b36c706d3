//! In-memory client task list.
//!
//! # Responsibility
//! - Hold the task list every renderer and the watcher read from.
//! - Apply server responses: wholesale replace on load, element-wise
//!   patches after each mutation.
//! - Resolve user-typed task references (full id or unique prefix).
//!
//! # Invariants
//! - Order mirrors the server listing (newest first); creates prepend.
//! - At most one entry per task id.

use crate::error::ClientError;
use duetask_core::{Task, TaskId};

#[derive(Debug, Clone, Default)]
pub struct TaskState {
    tasks: Vec<Task>,
}

impl TaskState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Prepends a freshly created task, replacing any stale copy.
    pub fn insert_front(&mut self, task: Task) {
        self.tasks.retain(|existing| existing.id != task.id);
        self.tasks.insert(0, task);
    }

    /// Replaces the entry with the same id. Returns `false` when the task is
    /// no longer held locally; the response is then dropped.
    pub fn upsert(&mut self, task: Task) -> bool {
        match self.get_mut(task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        Some(self.tasks.remove(index))
    }

    /// Resolves a full id or a unique, case-insensitive id prefix.
    pub fn resolve(&self, reference: &str) -> Result<TaskId, ClientError> {
        let needle = reference.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(ClientError::UnknownTask(reference.to_string()));
        }

        let mut matches = self
            .tasks
            .iter()
            .filter(|task| task.id.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task.id),
            (Some(_), Some(_)) => Err(ClientError::AmbiguousTask(reference.to_string())),
            (None, _) => Err(ClientError::UnknownTask(reference.to_string())),
        }
    }
}
