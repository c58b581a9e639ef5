// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::{Color, Colorize};
use tasksync_caldav::DiscoverySource;
use tasksync_core::LocalStore;

use crate::app::App;
use crate::arg::CommonArgs;
use crate::table::{Column, Table};
use crate::util::{OutputFormat, print_json};

#[derive(Debug, Clone, Copy)]
pub struct CmdDiscover {
    pub output_format: OutputFormat,
}

impl CmdDiscover {
    pub const NAME: &str = "discover";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("List the task collections found on the server")
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, app: &App) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "discovering collections...");
        let discovery = app.client().discover_collections().await;
        let known = app.store().list_collections().await?;

        let rows: Vec<DiscoveredCollection> = discovery
            .collections
            .iter()
            .map(|href| DiscoveredCollection {
                name: discovery.display_name(href),
                path: href.to_string(),
                tracked: known.iter().any(|c| &c.path == href),
            })
            .collect();

        match self.output_format {
            OutputFormat::Json => print_json(&Discovered {
                source: source_label(&discovery.source),
                error: failure(&discovery.source),
                collections: rows,
            })?,
            OutputFormat::Table => {
                if let Some(error) = failure(&discovery.source) {
                    println!("{} {}", "Discovery failed:".red(), error);
                    println!("Falling back to the configured collection root");
                } else if discovery.source == DiscoverySource::Fallback {
                    println!("{}", "No collections listed, using the configured root".yellow());
                }
                let columns = [
                    DiscoverColumn::Tracked,
                    DiscoverColumn::Name,
                    DiscoverColumn::Path,
                ];
                println!("{}", Table::new(&columns, &rows));
            }
        }
        Ok(())
    }
}

#[derive(Debug, serde::Serialize)]
struct Discovered {
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    collections: Vec<DiscoveredCollection>,
}

#[derive(Debug, serde::Serialize)]
struct DiscoveredCollection {
    name: String,
    path: String,
    /// Whether a local list already exists for it.
    tracked: bool,
}

const fn source_label(source: &DiscoverySource) -> &'static str {
    match source {
        DiscoverySource::Root => "root",
        DiscoverySource::ServerRoot => "server_root",
        DiscoverySource::Fallback => "fallback",
        DiscoverySource::Failed(_) => "failed",
    }
}

fn failure(source: &DiscoverySource) -> Option<String> {
    match source {
        DiscoverySource::Failed(error) => Some(error.clone()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum DiscoverColumn {
    Tracked,
    Name,
    Path,
}

impl Column<DiscoveredCollection> for DiscoverColumn {
    fn format(&self, data: &DiscoveredCollection) -> String {
        match self {
            Self::Tracked => (if data.tracked { "*" } else { "+" }).to_string(),
            Self::Name => data.name.clone(),
            Self::Path => data.path.clone(),
        }
    }

    fn get_color(&self, data: &DiscoveredCollection) -> Option<Color> {
        match self {
            Self::Tracked if data.tracked => Some(Color::Green),
            Self::Tracked => Some(Color::Cyan),
            _ => None,
        }
    }
}
