//! Mutation plumbing between client state and the task API.
//!
//! # Responsibility
//! - Send each user mutation through `TaskApi`.
//! - Reconcile the response into `TaskState` only after it succeeds.
//!
//! # Invariants
//! - A failed call is logged and leaves state exactly as it was.
//! - No retries; callers decide whether to surface the error.

use crate::api::TaskApi;
use crate::error::ClientError;
use crate::state::TaskState;
use duetask_core::{NewTask, Task, TaskId, TaskPatch};
use log::{info, warn};

pub struct TaskClient<A: TaskApi> {
    api: A,
    state: TaskState,
}

impl<A: TaskApi> TaskClient<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: TaskState::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TaskState {
        &mut self.state
    }

    /// Replaces client state with the server listing.
    pub async fn refresh(&mut self) -> Result<usize, ClientError> {
        match self.api.list_tasks().await {
            Ok(tasks) => {
                let count = tasks.len();
                self.state.replace_all(tasks);
                info!("event=state_refresh module=client status=ok count={count}");
                Ok(count)
            }
            Err(err) => Err(log_failure("state_refresh", None, err)),
        }
    }

    /// Creates a task; blank titles are refused without a request.
    pub async fn add_task(&mut self, title: &str, due_at: Option<i64>) -> Result<Task, ClientError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ClientError::Validation(
                "task title cannot be blank".to_string(),
            ));
        }

        let input = NewTask::new(title).with_due_at(due_at);
        match self.api.create_task(&input).await {
            Ok(task) => {
                info!(
                    "event=task_create module=client status=ok task_id={}",
                    task.id
                );
                self.state.insert_front(task.clone());
                Ok(task)
            }
            Err(err) => Err(log_failure("task_create", None, err)),
        }
    }

    pub async fn update_task(&mut self, id: TaskId, patch: &TaskPatch) -> Result<Task, ClientError> {
        match self.api.update_task(id, patch).await {
            Ok(task) => {
                self.state.upsert(task.clone());
                Ok(task)
            }
            Err(err) => Err(log_failure("task_update", Some(id), err)),
        }
    }

    /// Flips `completed` relative to the locally held copy.
    pub async fn toggle_completed(&mut self, id: TaskId) -> Result<Task, ClientError> {
        let current = self.local(id)?.completed;
        self.update_task(id, &TaskPatch::completed(!current)).await
    }

    /// Flips `important` relative to the locally held copy.
    pub async fn toggle_important(&mut self, id: TaskId) -> Result<Task, ClientError> {
        let current = self.local(id)?.important;
        self.update_task(id, &TaskPatch::important(!current)).await
    }

    pub async fn delete_task(&mut self, id: TaskId) -> Result<(), ClientError> {
        match self.api.delete_task(id).await {
            Ok(()) => {
                self.state.remove(id);
                info!("event=task_delete module=client status=ok task_id={id}");
                Ok(())
            }
            Err(err) => Err(log_failure("task_delete", Some(id), err)),
        }
    }

    /// Persists `notified=true` for tasks the watcher already marked locally.
    ///
    /// Returns how many writes succeeded. Failures keep the local mark.
    pub async fn persist_notified(&mut self, ids: &[TaskId]) -> usize {
        let mut persisted = 0;
        for id in ids {
            if self.update_task(*id, &TaskPatch::notified()).await.is_ok() {
                persisted += 1;
            }
        }
        persisted
    }

    fn local(&self, id: TaskId) -> Result<&Task, ClientError> {
        self.state
            .get(id)
            .ok_or_else(|| ClientError::UnknownTask(id.to_string()))
    }
}

fn log_failure(event: &str, id: Option<TaskId>, err: ClientError) -> ClientError {
    match id {
        Some(id) => warn!("event={event} module=client status=error task_id={id} error={err}"),
        None => warn!("event={event} module=client status=error error={err}"),
    }
    err
}
