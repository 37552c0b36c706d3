//! Core domain logic for DueTask.
//! This crate is the single source of truth for task invariants and storage.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{
    default_log_level, init_console_logging, init_logging, logging_status, LogSink,
};
pub use model::due::{format_due, parse_due_input, DueParseError};
pub use model::task::{DueState, NewTask, Task, TaskId, TaskPatch, TaskValidationError};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use service::task_service::{ServiceResult, TaskService, TaskServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Current wall-clock time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
