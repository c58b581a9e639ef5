// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::{ColoredString, Colorize};
use tasksync_core::{LocalStore, SyncState};

use crate::app::App;
use crate::arg::CommonArgs;
use crate::util::{OutputFormat, format_optional_timestamp, print_json};

#[derive(Debug, Clone, Copy)]
pub struct CmdStatus {
    pub output_format: OutputFormat,
}

impl CmdStatus {
    pub const NAME: &str = "status";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Show the outcome of the last sync passes and pending local changes")
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "reading sync status...");
        let store = app.store();
        let state = store.sync_state().await?;
        let collections = store.list_collections().await?.len();
        let pending = store.list_dirty_tasks().await?.len();

        let status = Status {
            server: app.config().server_url.clone(),
            collections,
            pending_changes: pending,
            state,
        };
        match self.output_format {
            OutputFormat::Json => print_json(&status)?,
            OutputFormat::Table => print_status(&status),
        }
        Ok(())
    }
}

#[derive(Debug, serde::Serialize)]
struct Status {
    server: String,
    collections: usize,
    pending_changes: usize,
    #[serde(flatten)]
    state: SyncState,
}

fn print_status(status: &Status) {
    println!("{}{}", label("Server"), status.server);
    println!("{}{}", label("Collections"), status.collections);
    println!("{}{}", label("Pending changes"), status.pending_changes);
    println!(
        "{}{}",
        label("Last attempt"),
        format_optional_timestamp(status.state.last_attempt)
    );
    println!(
        "{}{}",
        label("Last success"),
        format_optional_timestamp(status.state.last_success)
    );
    match &status.state.last_error {
        Some(error) => println!("{}{}", label("Last error"), error.red()),
        None => println!("{}{}", label("Last error"), "none".green()),
    }
}

fn label(name: &str) -> ColoredString {
    format!("{name:<16}").bold()
}
