// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, sync::Arc};

use clap::{ArgMatches, Command, arg};
use tasksync_core::{Scheduler, SchedulerState, SchedulerStatus, SyncEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;

use crate::app::App;

#[derive(Debug, Clone, Copy)]
pub struct CmdDaemon {
    pub no_initial_sync: bool,
}

impl CmdDaemon {
    pub const NAME: &str = "daemon";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Keep syncing in the background until interrupted")
            .arg(arg!(--"no-initial-sync" "Wait for the first periodic tick instead of syncing at startup"))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            no_initial_sync: matches.get_flag("no-initial-sync"),
        }
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        let options = app.config().scheduler_options();
        tracing::info!(
            interval = ?options.interval,
            debounce = ?options.debounce,
            "starting sync daemon"
        );

        let events = tokio::spawn(log_events(app.engine().subscribe()));
        let handle = Scheduler::spawn(Arc::clone(app.engine()), options);
        let passes = tokio::spawn(log_passes(handle.watch()));
        if !self.no_initial_sync {
            handle.sync_now();
        }

        tokio::signal::ctrl_c().await?;
        tracing::info!("interrupted, waiting for the current pass to finish");
        handle.shutdown().await;

        passes.abort();
        events.abort();
        tracing::info!("sync daemon stopped");
        Ok(())
    }
}

async fn log_passes(mut status: watch::Receiver<SchedulerStatus>) {
    let mut seen = status.borrow().passes;
    while status.changed().await.is_ok() {
        let current = status.borrow_and_update().clone();
        if current.state == SchedulerState::Running {
            tracing::debug!("sync pass running");
        }
        if current.passes == seen {
            continue;
        }
        seen = current.passes;
        match current.last_error {
            Some(error) => tracing::warn!(pass = seen, %error, "sync pass finished with errors"),
            None => tracing::info!(pass = seen, "sync pass finished"),
        }
    }
}

async fn log_events(mut events: broadcast::Receiver<SyncEvent>) {
    loop {
        match events.recv().await {
            Ok(SyncEvent::TaskUpserted(task)) => {
                tracing::debug!(id = %task.id, uid = ?task.uid, title = %task.data.title, "task updated");
            }
            Ok(SyncEvent::TaskDeleted { id, uid, .. }) => {
                tracing::debug!(%id, ?uid, "task removed");
            }
            Ok(SyncEvent::CollectionCreated(collection)) => {
                tracing::info!(name = %collection.name, path = %collection.path, "collection added");
            }
            Ok(SyncEvent::CollectionRetired(collection)) => {
                tracing::info!(name = %collection.name, path = %collection.path, "collection retired");
            }
            Err(RecvError::Lagged(n)) => tracing::debug!(skipped = n, "event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
