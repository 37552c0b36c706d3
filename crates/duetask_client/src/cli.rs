//! Command-line surface.

use crate::api::DEFAULT_API_URL;
use crate::view::Filter;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "duetask", version, about = "Task list client with due-time alerts")]
pub struct Cli {
    /// Base URL of the task server.
    #[arg(long, env = "DUETASK_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Print task payloads as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[arg(long, env = "DUETASK_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    /// Write rotating log files here instead of stderr.
    #[arg(long, env = "DUETASK_LOG_DIR", global = true)]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List tasks, newest first.
    List {
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
    },
    /// Create a task.
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        /// `+30m`, `2030-01-02 09:30`, RFC 3339 or epoch milliseconds.
        #[arg(long)]
        due: Option<String>,
    },
    /// Change a task's title or due time.
    Edit(EditArgs),
    /// Mark a task completed.
    Done { id: String },
    /// Mark a task not completed.
    Undone { id: String },
    /// Toggle a task's important flag.
    Star { id: String },
    /// Delete a task.
    Rm { id: String },
    /// Poll for due tasks and announce them until interrupted.
    Watch(WatchArgs),
    /// Interactive shell with the watcher running in the background.
    Shell(WatchArgs),
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    #[arg(long)]
    pub clear_due: bool,
}

#[derive(Debug, Clone, Copy, Args)]
pub struct WatchArgs {
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(50..))]
    pub interval_ms: u64,
    /// Reload from the server every N ticks (0 disables).
    #[arg(long, default_value_t = 30)]
    pub refresh_every: u32,
}
