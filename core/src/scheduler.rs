// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Decides when sync passes run.
//!
//! Local changes arm a debounce timer; its expiry starts a pass. A periodic
//! tick and explicit requests start passes too. Passes never overlap: a
//! request that arrives while one runs is served by one more pass afterwards.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::engine::SyncEngine;

/// Timing of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Time between periodic passes.
    pub interval: Duration,
    /// Quiet period after the last local change before a pass starts.
    pub debounce: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15 * 60),
            debounce: Duration::from_secs(2),
        }
    }
}

/// What the scheduler is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing pending.
    #[default]
    Idle,
    /// Changes are waiting for the debounce timer.
    Queued,
    /// A pass is in flight.
    Running,
}

/// Snapshot published by the scheduler after every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    /// Current state.
    pub state: SchedulerState,
    /// Passes finished so far, failed ones included.
    pub passes: u64,
    /// Error of the last finished pass.
    pub last_error: Option<String>,
}

/// A restartable one-shot timer.
#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    /// Creates a disarmed timer.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Starts the timer, or restarts it if it is already running.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    /// Stops the timer.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether the timer is running.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the timer fires, if armed.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Changed,
    SyncNow,
    Shutdown,
}

/// Runs sync passes in the background.
#[derive(Debug)]
pub struct Scheduler {
    engine: Arc<SyncEngine>,
    options: SchedulerOptions,
    debounce: Debounce,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<SchedulerStatus>,
    running: bool,
    rerun: bool,
}

impl Scheduler {
    /// Starts the scheduler on the current tokio runtime.
    pub fn spawn(engine: Arc<SyncEngine>, options: SchedulerOptions) -> SchedulerHandle {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(SchedulerStatus::default());
        let scheduler = Self {
            engine,
            options,
            debounce: Debounce::new(options.debounce),
            commands,
            status,
            running: false,
            rerun: false,
        };

        let task = tokio::spawn(scheduler.run());
        SchedulerHandle {
            commands: commands_tx,
            status: status_rx,
            task,
        }
    }

    async fn run(mut self) {
        tracing::debug!(interval = ?self.options.interval, debounce = ?self.options.debounce, "scheduler started");
        let mut interval =
            time::interval_at(Instant::now() + self.options.interval, self.options.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let (done_tx, mut done_rx) = mpsc::channel::<Result<(), String>>(1);

        loop {
            let deadline = self.debounce.deadline();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Changed) => {
                        self.debounce.arm();
                        if !self.running {
                            self.set_state(SchedulerState::Queued);
                        }
                    }
                    Some(Command::SyncNow) => {
                        if self.running {
                            self.rerun = true;
                        } else {
                            self.start_pass(&done_tx);
                        }
                    }
                    Some(Command::Shutdown) | None => break,
                },

                () = time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() && !self.running =>
                {
                    tracing::debug!("debounce expired");
                    self.start_pass(&done_tx);
                }

                _ = interval.tick() => {
                    if self.running {
                        tracing::debug!("periodic sync skipped, pass in flight");
                    } else {
                        tracing::debug!("periodic sync");
                        self.start_pass(&done_tx);
                    }
                }

                Some(outcome) = done_rx.recv() => self.finish_pass(outcome, &done_tx),
            }
        }

        self.rerun = false;
        self.debounce.cancel();
        if self.running
            && let Some(outcome) = done_rx.recv().await
        {
            self.finish_pass(outcome, &done_tx);
        }
        self.set_state(SchedulerState::Idle);
        tracing::debug!("scheduler stopped");
    }

    fn start_pass(&mut self, done: &mpsc::Sender<Result<(), String>>) {
        // the pass reconciles everything changed so far
        self.debounce.cancel();
        self.running = true;
        self.set_state(SchedulerState::Running);

        let engine = Arc::clone(&self.engine);
        let done = done.clone();
        tokio::spawn(async move {
            let outcome = engine.sync().await.map(|_| ()).map_err(|e| e.to_string());
            // the scheduler may be gone already
            let _ = done.send(outcome).await;
        });
    }

    fn finish_pass(&mut self, outcome: Result<(), String>, done: &mpsc::Sender<Result<(), String>>) {
        self.running = false;
        self.status.send_modify(|status| {
            status.passes += 1;
            status.last_error = outcome.err();
        });

        if self.rerun {
            self.rerun = false;
            self.start_pass(done);
        } else if self.debounce.is_armed() {
            self.set_state(SchedulerState::Queued);
        } else {
            self.set_state(SchedulerState::Idle);
        }
    }

    fn set_state(&self, state: SchedulerState) {
        self.status.send_if_modified(|status| {
            let changed = status.state != state;
            status.state = state;
            changed
        });
    }
}

/// Controls a running [`Scheduler`].
#[derive(Debug)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SchedulerStatus>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Reports a local change; a pass follows once changes stop for the
    /// debounce window.
    pub fn notify_changed(&self) {
        self.send(Command::Changed);
    }

    /// Requests a pass right away, or right after the one in flight.
    pub fn sync_now(&self) {
        self.send(Command::SyncNow);
    }

    /// The current status.
    #[must_use]
    pub fn status(&self) -> SchedulerStatus {
        self.status.borrow().clone()
    }

    /// A receiver that observes every status change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SchedulerStatus> {
        self.status.clone()
    }

    /// Stops the scheduler, waiting for a pass in flight to finish.
    pub async fn shutdown(self) {
        self.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "scheduler task failed");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!(?command, "scheduler is not running");
        }
    }
}
