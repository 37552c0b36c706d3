//! Interactive shell: user commands and the due-task watcher on one loop.
//!
//! # Responsibility
//! - Parse line commands and dispatch them to `TaskClient`.
//! - Drive the watcher tick between commands on the same task, so command
//!   handlers, network responses and ticks never run concurrently.
//!
//! # Invariants
//! - A failed command prints an error and leaves client state untouched.
//! - Only one edit draft exists at a time.

use crate::api::TaskApi;
use crate::client::TaskClient;
use crate::error::ClientError;
use crate::notifier::Notifier;
use crate::view::{render_list, render_task_line, short_id, EditSession, Filter};
use crate::watcher::{tick_and_persist, Clock, DueWatcher, WatchOptions};
use duetask_core::{format_due, parse_due_input};
use log::warn;
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;

pub const HELP_TEXT: &str = "\
commands:
  list [all|active|completed|important]   show tasks (sets the filter)
  add <title> [@<when>]                    create a task, e.g. `add Pay rent @+1h`
  done <id>                                toggle completion
  star <id>                                toggle importance
  rm <id>                                  delete a task
  edit <id>                                start editing (cancels any other edit)
  title <text> | due <when|none>           change the draft
  save | cancel                            finish editing
  refresh                                  reload from the server
  help | quit
<id> is any unique id prefix; <when> is +N[smhd], YYYY-MM-DD HH:MM or RFC 3339.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    List(Option<Filter>),
    Add { title: String, due: Option<String> },
    ToggleDone(String),
    ToggleStar(String),
    Remove(String),
    Edit(String),
    Title(String),
    Due(String),
    Save,
    Cancel,
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellCommand::Empty);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let require = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("`{verb}` needs {what}"))
        } else {
            Ok(rest.to_string())
        }
    };

    match verb.to_ascii_lowercase().as_str() {
        "list" | "ls" => {
            if rest.is_empty() {
                Ok(ShellCommand::List(None))
            } else {
                rest.parse().map(|filter| ShellCommand::List(Some(filter)))
            }
        }
        "add" => {
            let text = require("a title")?;
            let (title, due) = match text.rsplit_once(" @") {
                Some((title, due)) => (title.trim().to_string(), Some(due.trim().to_string())),
                None => (text, None),
            };
            Ok(ShellCommand::Add { title, due })
        }
        "done" | "toggle" => require("a task id").map(ShellCommand::ToggleDone),
        "star" | "important" => require("a task id").map(ShellCommand::ToggleStar),
        "rm" | "delete" => require("a task id").map(ShellCommand::Remove),
        "edit" => require("a task id").map(ShellCommand::Edit),
        "title" => require("a title").map(ShellCommand::Title),
        "due" => require("a due time or `none`").map(ShellCommand::Due),
        "save" => Ok(ShellCommand::Save),
        "cancel" => Ok(ShellCommand::Cancel),
        "refresh" => Ok(ShellCommand::Refresh),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command `{other}`; type `help`")),
    }
}

pub struct Shell<A: TaskApi> {
    client: TaskClient<A>,
    watcher: DueWatcher,
    edit: EditSession,
    filter: Filter,
}

impl<A: TaskApi> Shell<A> {
    pub fn new(client: TaskClient<A>) -> Self {
        Self {
            client,
            watcher: DueWatcher::new(),
            edit: EditSession::new(),
            filter: Filter::All,
        }
    }

    pub fn client(&self) -> &TaskClient<A> {
        &self.client
    }

    pub fn watcher(&self) -> &DueWatcher {
        &self.watcher
    }

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    /// Runs one command; client failures are printed, not returned.
    pub async fn execute<W: Write>(
        &mut self,
        command: ShellCommand,
        now_ms: i64,
        out: &mut W,
    ) -> std::io::Result<Flow> {
        match self.dispatch(command, now_ms, out).await {
            Ok(flow) => Ok(flow),
            Err(ShellError::Io(err)) => Err(err),
            Err(ShellError::Client(err)) => {
                writeln!(out, "error: {err}")?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn dispatch<W: Write>(
        &mut self,
        command: ShellCommand,
        now_ms: i64,
        out: &mut W,
    ) -> Result<Flow, ShellError> {
        match command {
            ShellCommand::Empty => {}
            ShellCommand::List(filter) => {
                if let Some(filter) = filter {
                    self.filter = filter;
                }
                let rendered = render_list(
                    self.client.state(),
                    self.filter,
                    self.watcher.active_alerts(),
                    now_ms,
                );
                write!(out, "{rendered}")?;
            }
            ShellCommand::Add { title, due } => {
                let due_at = match due {
                    Some(raw) => parse_due_input(&raw, now_ms)?,
                    None => None,
                };
                let task = self.client.add_task(&title, due_at).await?;
                writeln!(out, "added {}", render_task_line(&task, now_ms))?;
            }
            ShellCommand::ToggleDone(reference) => {
                let id = self.client.state().resolve(&reference)?;
                let task = self.client.toggle_completed(id).await?;
                writeln!(out, "{}", render_task_line(&task, now_ms))?;
            }
            ShellCommand::ToggleStar(reference) => {
                let id = self.client.state().resolve(&reference)?;
                let task = self.client.toggle_important(id).await?;
                writeln!(out, "{}", render_task_line(&task, now_ms))?;
            }
            ShellCommand::Remove(reference) => {
                let id = self.client.state().resolve(&reference)?;
                self.client.delete_task(id).await?;
                if self.edit.is_editing(id) {
                    self.edit.cancel();
                }
                writeln!(out, "deleted {}", short_id(id))?;
            }
            ShellCommand::Edit(reference) => {
                let id = self.client.state().resolve(&reference)?;
                let task = self
                    .client
                    .state()
                    .get(id)
                    .ok_or_else(|| ClientError::UnknownTask(reference.clone()))?;
                if let Some(previous) = self.edit.begin(task) {
                    if previous.task_id != id {
                        writeln!(out, "discarded unsaved edit of {}", short_id(previous.task_id))?;
                    }
                }
                self.write_draft(out)?;
            }
            ShellCommand::Title(title) => {
                self.edit.set_title(&title)?;
                self.write_draft(out)?;
            }
            ShellCommand::Due(raw) => {
                let due_at = parse_due_input(&raw, now_ms)?;
                self.edit.set_due(due_at)?;
                self.write_draft(out)?;
            }
            ShellCommand::Save => {
                let (id, patch) = self.edit.save_patch()?;
                let task = self.client.update_task(id, &patch).await?;
                self.edit.cancel();
                writeln!(out, "saved {}", render_task_line(&task, now_ms))?;
            }
            ShellCommand::Cancel => {
                if self.edit.cancel().is_some() {
                    writeln!(out, "edit cancelled")?;
                }
            }
            ShellCommand::Refresh => {
                let count = self.client.refresh().await?;
                writeln!(out, "loaded {count} task(s)")?;
            }
            ShellCommand::Help => writeln!(out, "{HELP_TEXT}")?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn write_draft<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if let Some(draft) = self.edit.current() {
            let due = draft
                .due_at
                .map(format_due)
                .unwrap_or_else(|| "none".to_string());
            writeln!(
                out,
                "editing {}: title=\"{}\" due={due} (save | cancel)",
                short_id(draft.task_id),
                draft.title
            )?;
        }
        Ok(())
    }

    /// Reads commands until EOF, `quit` or `shutdown`, ticking the watcher
    /// in between.
    pub async fn run<R, W>(
        &mut self,
        input: R,
        mut out: W,
        notifier: &mut dyn Notifier,
        clock: &dyn Clock,
        options: WatchOptions,
        shutdown: impl Future<Output = ()>,
    ) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        let mut ticker = tokio::time::interval(options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if options.refresh_every > 0 && ticks > 0 && ticks % u64::from(options.refresh_every) == 0 {
                        let _ = self.client.refresh().await;
                    }
                    ticks += 1;
                    tick_and_persist(&mut self.client, &mut self.watcher, clock.now_ms(), notifier).await;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let flow = match parse_command(&line) {
                            Ok(command) => self.execute(command, clock.now_ms(), &mut out).await?,
                            Err(message) => {
                                writeln!(out, "error: {message}")?;
                                Flow::Continue
                            }
                        };
                        out.flush()?;
                        if flow == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        warn!("event=shell_input module=shell status=error error={err}");
                        break;
                    }
                },
                _ = &mut shutdown => break,
            }
        }
        Ok(())
    }
}

enum ShellError {
    Io(std::io::Error),
    Client(ClientError),
}

impl From<std::io::Error> for ShellError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ClientError> for ShellError {
    fn from(value: ClientError) -> Self {
        Self::Client(value)
    }
}

impl From<duetask_core::DueParseError> for ShellError {
    fn from(value: duetask_core::DueParseError) -> Self {
        Self::Client(value.into())
    }
}
