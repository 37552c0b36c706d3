//! Due-task watcher.
//!
//! # Responsibility
//! - On each tick, find tasks whose due time has passed and announce them.
//! - Keep short-lived "currently displayed" alerts for the renderer.
//! - Hand fired ids to the client so `notified=true` is persisted.
//!
//! # Invariants
//! - A task is announced at most once per session: it is marked notified in
//!   local state and remembered as fired before any network call starts.
//! - Completed tasks and tasks without a due time are never announced.
//! - The persisted `notified` flag is the only durable record; the watcher
//!   itself keeps nothing across restarts.

use crate::api::TaskApi;
use crate::client::TaskClient;
use crate::notifier::{due_message, Notifier};
use crate::state::TaskState;
use duetask_core::{now_epoch_ms, TaskId};
use log::{debug, info};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_ALERT_WINDOW_MS: i64 = 5_000;

/// Source of "now" in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        now_epoch_ms()
    }
}

/// An alert still inside its display window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAlert {
    pub task_id: TaskId,
    pub message: String,
    pub expires_at: i64,
}

#[derive(Debug)]
pub struct DueWatcher {
    fired: HashSet<TaskId>,
    alerts: Vec<ActiveAlert>,
    alert_window_ms: i64,
}

impl Default for DueWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DueWatcher {
    pub fn new() -> Self {
        Self::with_alert_window(DEFAULT_ALERT_WINDOW_MS)
    }

    pub fn with_alert_window(alert_window_ms: i64) -> Self {
        Self {
            fired: HashSet::new(),
            alerts: Vec::new(),
            alert_window_ms,
        }
    }

    /// Evaluates every task against `now_ms` once.
    ///
    /// Due tasks are marked `notified` in `state` immediately, announced, and
    /// returned so the caller can persist the flag.
    pub fn tick(
        &mut self,
        state: &mut TaskState,
        now_ms: i64,
        notifier: &mut dyn Notifier,
    ) -> Vec<TaskId> {
        self.expire_alerts(now_ms);

        let due: Vec<TaskId> = state
            .tasks()
            .iter()
            .filter(|task| task.is_due(now_ms) && !self.fired.contains(&task.id))
            .map(|task| task.id)
            .collect();

        for id in &due {
            self.fired.insert(*id);
            let Some(task) = state.get_mut(*id) else {
                continue;
            };
            task.notified = true;
            notifier.announce(task);
            self.alerts.push(ActiveAlert {
                task_id: *id,
                message: due_message(task),
                expires_at: now_ms + self.alert_window_ms,
            });
            info!("event=task_due module=watcher status=ok task_id={id}");
        }

        due
    }

    /// Alerts whose display window has not yet elapsed.
    pub fn active_alerts(&self) -> &[ActiveAlert] {
        &self.alerts
    }

    pub fn has_fired(&self, id: TaskId) -> bool {
        self.fired.contains(&id)
    }

    fn expire_alerts(&mut self, now_ms: i64) {
        self.alerts.retain(|alert| alert.expires_at > now_ms);
    }
}

/// Result of one tick including persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub fired: Vec<TaskId>,
    pub persisted: usize,
}

/// Runs one watcher tick and writes `notified=true` back through the API.
pub async fn tick_and_persist<A: TaskApi>(
    client: &mut TaskClient<A>,
    watcher: &mut DueWatcher,
    now_ms: i64,
    notifier: &mut dyn Notifier,
) -> TickOutcome {
    let fired = watcher.tick(client.state_mut(), now_ms, notifier);
    let persisted = if fired.is_empty() {
        0
    } else {
        client.persist_notified(&fired).await
    };
    TickOutcome { fired, persisted }
}

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub interval: Duration,
    /// Reload from the server every N ticks; `0` disables reloads.
    pub refresh_every: u32,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_TICK_INTERVAL,
            refresh_every: 30,
        }
    }
}

/// Ticks until `shutdown` resolves.
pub async fn run_watch<A: TaskApi>(
    client: &mut TaskClient<A>,
    watcher: &mut DueWatcher,
    notifier: &mut dyn Notifier,
    clock: &dyn Clock,
    options: WatchOptions,
    shutdown: impl Future<Output = ()>,
) {
    let mut ticker = tokio::time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);
    let mut ticks: u64 = 0;

    info!(
        "event=watch_start module=watcher status=ok interval_ms={}",
        options.interval.as_millis()
    );
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if options.refresh_every > 0 && ticks > 0 && ticks % u64::from(options.refresh_every) == 0 {
                    // Failure is logged by the client and the old list is kept.
                    let _ = client.refresh().await;
                }
                ticks += 1;
                let outcome = tick_and_persist(client, watcher, clock.now_ms(), notifier).await;
                if !outcome.fired.is_empty() {
                    debug!(
                        "event=watch_tick module=watcher status=ok fired={} persisted={}",
                        outcome.fired.len(),
                        outcome.persisted
                    );
                }
            }
            _ = &mut shutdown => break,
        }
    }
    info!("event=watch_stop module=watcher status=ok ticks={ticks}");
}
