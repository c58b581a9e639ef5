// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use jiff::Timestamp;
use jiff::tz::TimeZone;
use serde::Serialize;

/// The output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Prints `value` as pretty JSON.
pub fn print_json(value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Formats a timestamp in the local time zone, down to the second.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.to_zoned(TimeZone::system())
        .strftime("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Formats an optional timestamp, or `never`.
pub fn format_optional_timestamp(ts: Option<Timestamp>) -> String {
    ts.map_or_else(|| "never".to_string(), format_timestamp)
}
