// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! To-do component (VTODO) as exchanged with a `CalDAV` server.

use jiff::civil::DateTime;

/// Status of a to-do (RFC 5545 Section 3.8.1.11).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::AsRefStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum TodoStatus {
    /// To-do needs action.
    #[default]
    #[strum(serialize = "NEEDS-ACTION")]
    NeedsAction,

    /// To-do is in process.
    #[strum(serialize = "IN-PROCESS")]
    InProcess,

    /// To-do is completed.
    #[strum(serialize = "COMPLETED")]
    Completed,

    /// To-do is cancelled.
    #[strum(serialize = "CANCELLED")]
    Cancelled,
}

impl TodoStatus {
    /// Reads a status value, falling back to `NEEDS-ACTION` for anything
    /// unrecognized.
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        value.trim().parse().unwrap_or_default()
    }
}

/// The wire subset of a VTODO component.
///
/// Optional text fields are `None` when absent; the formatter never writes
/// them as empty properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VTodo {
    /// Unique identifier, stable across systems.
    pub uid: String,

    /// Summary/title of the to-do.
    pub summary: String,

    /// Description of the to-do.
    pub description: Option<String>,

    /// Location of the to-do.
    pub location: Option<String>,

    /// URL associated with the to-do.
    pub url: Option<String>,

    /// Organizer, usually a `mailto:` address.
    pub organizer: Option<String>,

    /// Priority as written on the wire (1-9, 1 is highest). `None` means undefined.
    pub priority: Option<u8>,

    /// Status of the to-do.
    pub status: TodoStatus,

    /// Floating start time.
    pub dt_start: Option<DateTime>,

    /// Floating due time.
    pub due: Option<DateTime>,

    /// Floating creation time.
    pub created: Option<DateTime>,

    /// Floating completion time.
    pub completed: Option<DateTime>,

    /// Floating last-modified time, only read from input.
    pub last_modified: Option<DateTime>,

    /// Percentage complete (0-100).
    pub percent_complete: u8,

    /// Free-text categories.
    pub categories: Vec<String>,
}

impl VTodo {
    /// Creates a to-do with the given uid and summary and everything else unset.
    #[must_use]
    pub fn new(uid: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            summary: summary.into(),
            ..Default::default()
        }
    }
}
