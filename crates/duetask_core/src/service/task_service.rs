//! Task use-case service.
//!
//! # Responsibility
//! - Provide the list/create/get/update/delete use-cases behind the API.
//! - Translate repository failures into the validation / not-found / store
//!   taxonomy surfaced to callers.
//!
//! # Invariants
//! - Blank titles are rejected before anything is persisted.
//! - Partial updates only change fields present in the patch.
//! - Concurrent updates of the same task are last-write-wins.

use crate::model::task::{NewTask, Task, TaskId, TaskPatch, TaskValidationError};
use crate::now_epoch_ms;
use crate::repo::task_repo::{RepoError, TaskRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Input failed a write-time invariant.
    Validation(TaskValidationError),
    /// Target task does not exist.
    NotFound(TaskId),
    /// Persistence-layer failure.
    Store(RepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<TaskValidationError> for TaskServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type ServiceResult<T> = Result<T, TaskServiceError>;

/// Task service facade over repository implementations.
pub struct TaskService<R: TaskRepository> {
    repo: R,
    clock: fn() -> i64,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates a service stamping writes with wall-clock time.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, now_epoch_ms)
    }

    /// Creates a service with an injected epoch-millisecond clock.
    pub fn with_clock(repo: R, clock: fn() -> i64) -> Self {
        Self { repo, clock }
    }

    /// Lists every task, newest created first.
    pub fn list_tasks(&self) -> ServiceResult<Vec<Task>> {
        let tasks = self.repo.list_tasks()?;
        info!(
            "event=task_list module=service status=ok count={}",
            tasks.len()
        );
        Ok(tasks)
    }

    /// Creates one task and returns it with its assigned ID.
    pub fn create_task(&self, input: &NewTask) -> ServiceResult<Task> {
        let started_at = Instant::now();
        let task = Task::from_new(input, (self.clock)());
        if let Err(err) = task.validate() {
            warn!("event=task_create module=service status=rejected reason=validation");
            return Err(err.into());
        }

        self.repo.create_task(&task)?;
        info!(
            "event=task_create module=service status=ok task_id={} has_due={} duration_ms={}",
            task.id,
            task.due_at.is_some(),
            started_at.elapsed().as_millis()
        );
        Ok(task)
    }

    /// Gets one task by ID.
    pub fn get_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.repo
            .get_task(id)?
            .ok_or(TaskServiceError::NotFound(id))
    }

    /// Applies a sparse patch and returns the stored result.
    pub fn update_task(&self, id: TaskId, patch: &TaskPatch) -> ServiceResult<Task> {
        let started_at = Instant::now();
        if let Err(err) = patch.validate() {
            warn!(
                "event=task_update module=service status=rejected reason=validation task_id={id}"
            );
            return Err(err.into());
        }

        let mut task = self.get_task(id)?;
        if patch.is_empty() {
            return Ok(task);
        }

        patch.apply_to(&mut task);
        task.updated_at = (self.clock)();
        self.repo.update_task(&task)?;
        info!(
            "event=task_update module=service status=ok task_id={} notified={} completed={} duration_ms={}",
            task.id,
            task.notified,
            task.completed,
            started_at.elapsed().as_millis()
        );
        Ok(task)
    }

    /// Hard-deletes one task.
    pub fn delete_task(&self, id: TaskId) -> ServiceResult<()> {
        match self.repo.delete_task(id) {
            Ok(()) => {
                info!("event=task_delete module=service status=ok task_id={id}");
                Ok(())
            }
            Err(err) => {
                warn!("event=task_delete module=service status=error task_id={id} error={err}");
                Err(err.into())
            }
        }
    }
}
