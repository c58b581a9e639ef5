// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line front end of the task sync service.

mod app;
mod arg;
mod cli;
mod cmd_daemon;
mod cmd_discover;
mod cmd_generate_completion;
mod cmd_status;
mod cmd_sync;
mod config;
mod table;
mod util;

pub use crate::cli::{Cli, Commands, run};
