// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::Colorize;
use tasksync_core::SyncReport;

use crate::app::App;
use crate::arg::CommonArgs;
use crate::table::{Column, PaddingDirection, Table};
use crate::util::{OutputFormat, print_json};

#[derive(Debug, Clone, Copy)]
pub struct CmdSync {
    pub output_format: OutputFormat,
}

impl CmdSync {
    pub const NAME: &str = "sync";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Run one sync pass now and print what it did")
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "running sync pass...");
        let report = app.engine().sync().await?;

        match self.output_format {
            OutputFormat::Json => print_json(&report)?,
            OutputFormat::Table => print_report(&report),
        }
        Ok(())
    }
}

/// Prints the counters of a pass, followed by its item failures.
pub fn print_report(report: &SyncReport) {
    let rows = report_rows(report);
    println!("{}", Table::new(&[ReportColumn::Label, ReportColumn::Count], &rows));

    if report.is_clean() {
        println!("{}", "Sync finished".green());
        return;
    }

    println!(
        "{} {} item(s) failed",
        "Sync finished with errors:".yellow(),
        report.errors.len()
    );
    for error in &report.errors {
        println!("  {} {}: {}", error.kind.to_string().red(), error.target, error.message);
    }
}

fn report_rows(report: &SyncReport) -> Vec<(&'static str, u64)> {
    let counts = [
        ("Collections", report.collections),
        ("Collections created", report.collections_created),
        ("Collections retired", report.collections_retired),
        ("Pushed, created", report.pushed_created),
        ("Pushed, updated", report.pushed_updated),
        ("Pushed, deleted", report.pushed_deleted),
        ("Pulled, created", report.pulled_created),
        ("Pulled, updated", report.pulled_updated),
        ("Pulled, unchanged", report.pulled_unchanged),
        ("Pulled, suppressed", report.pulled_suppressed),
        ("Pulled, removed", report.pulled_removed),
        ("Skipped resources", report.skipped_resources),
    ];

    let mut rows: Vec<_> = counts
        .into_iter()
        .map(|(label, n)| (label, n as u64))
        .collect();
    rows.push(("Tombstones pruned", report.tombstones_pruned));
    rows.push(("Tasks purged", report.tasks_purged));
    rows
}

#[derive(Debug, Clone, Copy)]
enum ReportColumn {
    Label,
    Count,
}

impl Column<(&'static str, u64)> for ReportColumn {
    fn format(&self, data: &(&'static str, u64)) -> String {
        match self {
            Self::Label => data.0.to_string(),
            Self::Count => data.1.to_string(),
        }
    }

    fn padding_direction(&self) -> PaddingDirection {
        match self {
            Self::Label => PaddingDirection::Left,
            Self::Count => PaddingDirection::Right,
        }
    }
}
