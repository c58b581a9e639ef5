// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, io, path::PathBuf};

use clap::{ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use colored::Colorize;
use futures::{FutureExt, future::BoxFuture};
use tasksync_core::APP_NAME;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::arg::CommonArgs;
use crate::cmd_daemon::CmdDaemon;
use crate::cmd_discover::CmdDiscover;
use crate::cmd_generate_completion::CmdGenerateCompletion;
use crate::cmd_status::CmdStatus;
use crate::cmd_sync::CmdSync;
use crate::config::parse_config;

/// Run the tasksync command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    match Cli::parse() {
        Ok(cli) => {
            init_tracing(cli.verbose);
            if let Err(e) = cli.run().await {
                println!("{} {}", "Error:".red(), e);
            }
        }
        Err(e) => println!("{} {}", "Error:".red(), e),
    }
    Ok(())
}

/// Logs go to stderr. `RUST_LOG` applies unless `-v` is given.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// Log verbosity raised by `-v`
    pub verbose: u8,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Keep a local task list in sync with CalDAV task collections.")
            .author("Zexin Yuan <aim@yzx9.xyz>")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $TASKSYNC_CONFIG if set, otherwise \
$XDG_CONFIG_HOME/tasksync/config.toml on Linux and MacOS, \
%LOCALAPPDATA%/tasksync/config.toml on Windows.",
                    )
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath)
                    .global(true),
            )
            .arg(CommonArgs::verbose())
            .subcommand(CmdSync::command())
            .subcommand(CmdDaemon::command())
            .subcommand(CmdStatus::command())
            .subcommand(CmdDiscover::command())
            .subcommand(CmdGenerateCompletion::command())
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let commands = Self::command();
        let matches = commands.get_matches();
        Self::from(&matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let commands = Self::command();
        let matches = commands.try_get_matches_from(args)?;
        Self::from(&matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        use Commands::{Daemon, Discover, GenerateCompletion, Status, Sync};
        let command = match matches.subcommand() {
            Some((CmdSync::NAME, matches)) => Sync(CmdSync::from(matches)),
            Some((CmdDaemon::NAME, matches)) => Daemon(CmdDaemon::from(matches)),
            Some((CmdStatus::NAME, matches)) => Status(CmdStatus::from(matches)),
            Some((CmdDiscover::NAME, matches)) => Discover(CmdDiscover::from(matches)),
            Some((CmdGenerateCompletion::NAME, matches)) => {
                GenerateCompletion(CmdGenerateCompletion::from(matches))
            }
            Some((name, _)) => return Err(format!("unknown command: {name}").into()),
            None => return Err("no command given".into()),
        };

        let config = matches.get_one("config").cloned();
        let verbose = CommonArgs::get_verbose(matches);
        Ok(Cli {
            config,
            verbose,
            command,
        })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// Run one sync pass
    Sync(CmdSync),

    /// Keep syncing until interrupted
    Daemon(CmdDaemon),

    /// Show the persisted sync state
    Status(CmdStatus),

    /// List the collections on the server
    Discover(CmdDiscover),

    /// Generate shell completion
    GenerateCompletion(CmdGenerateCompletion),
}

impl Commands {
    /// Run the command with the given configuration
    #[rustfmt::skip]
    pub async fn run(self, config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
        use Commands::{Daemon, Discover, GenerateCompletion, Status, Sync};
        match self {
            Sync(a)     => Self::run_with(config, |x| a.run(x).boxed()).await,
            Daemon(a)   => Self::run_with(config, |x| a.run(x).boxed()).await,
            Status(a)   => Self::run_with(config, |x| a.run(x).boxed()).await,
            Discover(a) => Self::run_with(config, |x| a.run(x).boxed()).await,
            GenerateCompletion(a) => a.run(),
        }
    }

    async fn run_with<F>(config: Option<PathBuf>, f: F) -> Result<(), Box<dyn Error>>
    where
        F: for<'a> FnOnce(&'a App) -> BoxFuture<'a, Result<(), Box<dyn Error>>>,
    {
        tracing::debug!("parsing configuration...");
        let config = parse_config(config).await?;
        let app = App::new(config).await?;

        let result = f(&app).await;

        app.close().await;
        result
    }
}
