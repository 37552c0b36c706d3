//! Host notification sinks.

use duetask_core::{Task, TaskId};
use log::warn;
use std::io::Write;

/// Raises a user-visible (and audible, where supported) due alert.
pub trait Notifier {
    fn announce(&mut self, task: &Task);
}

/// Human-readable alert line shared by every sink.
pub fn due_message(task: &Task) -> String {
    format!("Task \"{}\" is due!", task.title)
}

/// Writes alerts to a terminal, optionally ringing the bell.
pub struct TerminalNotifier<W: Write> {
    out: W,
    bell: bool,
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W, bell: bool) -> Self {
        Self { out, bell }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalNotifier<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout(), true)
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn announce(&mut self, task: &Task) {
        let bell = if self.bell { "\x07" } else { "" };
        let written = writeln!(self.out, "{bell}[due] {}", due_message(task))
            .and_then(|()| self.out.flush());
        if let Err(err) = written {
            warn!(
                "event=notify module=notifier status=error task_id={} error={err}",
                task.id
            );
        }
    }
}

/// Remembers announced ids in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    announced: Vec<TaskId>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn announced(&self) -> &[TaskId] {
        &self.announced
    }

    pub fn count_for(&self, id: TaskId) -> usize {
        self.announced.iter().filter(|seen| **seen == id).count()
    }
}

impl Notifier for RecordingNotifier {
    fn announce(&mut self, task: &Task) {
        self.announced.push(task.id);
    }
}
