//! Terminal client for the DueTask API.
//!
//! # Responsibility
//! - Hold the client-side task list and keep it in step with the server.
//! - Watch for due tasks and raise one alert per task.
//! - Present tasks as a one-shot CLI or an interactive shell.

pub mod api;
pub mod cli;
pub mod client;
pub mod error;
pub mod notifier;
pub mod shell;
pub mod state;
pub mod view;
pub mod watcher;

pub use api::{HttpTaskApi, TaskApi, DEFAULT_API_URL};
pub use client::TaskClient;
pub use error::ClientError;
pub use notifier::{due_message, Notifier, RecordingNotifier, TerminalNotifier};
pub use shell::{parse_command, Shell, ShellCommand};
pub use state::TaskState;
pub use view::{render_list, render_task_line, EditSession, Filter};
pub use watcher::{
    run_watch, tick_and_persist, ActiveAlert, Clock, DueWatcher, SystemClock, TickOutcome,
    WatchOptions,
};
