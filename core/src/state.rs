// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use jiff::Timestamp;

/// Persisted outcome of the most recent sync passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SyncState {
    /// When the last pass started.
    pub last_attempt: Option<Timestamp>,
    /// When the last pass that reached the server started.
    pub last_success: Option<Timestamp>,
    /// Error of the last pass, or a summary of its item failures.
    pub last_error: Option<String>,
}

/// The stage an item failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemErrorKind {
    /// Collection discovery failed and the fallback collection was used.
    Discovery,
    /// A local change could not be pushed.
    Push,
    /// A collection could not be fetched.
    Fetch,
    /// A remote resource could not be parsed.
    Parse,
    /// A single local write failed.
    Store,
}

impl ItemErrorKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Push => "push",
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for ItemErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure confined to one task, resource or collection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ItemError {
    /// Where it happened.
    pub kind: ItemErrorKind,
    /// What it happened to: a uid, task id or collection path.
    pub target: String,
    /// The error message.
    pub message: String,
}

impl ItemError {
    pub(crate) fn new(
        kind: ItemErrorKind,
        target: impl fmt::Display,
        message: impl fmt::Display,
    ) -> Self {
        Self {
            kind,
            target: target.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.target, self.message)
    }
}

/// What one sync pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SyncReport {
    /// Collections the pass worked on.
    pub collections: usize,
    /// Local lists created for newly discovered collections.
    pub collections_created: usize,
    /// Local lists retired because their collection disappeared.
    pub collections_retired: usize,

    /// Local tasks created on the server.
    pub pushed_created: usize,
    /// Local changes written to the server.
    pub pushed_updated: usize,
    /// Local deletions applied on the server.
    pub pushed_deleted: usize,

    /// Remote tasks created locally.
    pub pulled_created: usize,
    /// Local tasks overwritten by a newer remote revision.
    pub pulled_updated: usize,
    /// Remote tasks already up to date locally.
    pub pulled_unchanged: usize,
    /// Remote tasks ignored because they are deleted locally.
    pub pulled_suppressed: usize,
    /// Local tasks removed because they are gone from the server.
    pub pulled_removed: usize,

    /// Remote resources that could not be parsed.
    pub skipped_resources: usize,
    /// Expired tombstones dropped at the start of the pass.
    pub tombstones_pruned: u64,
    /// Deleted tasks purged at the end of the pass.
    pub tasks_purged: u64,

    /// Failures that did not stop the pass.
    pub errors: Vec<ItemError>,
}

impl SyncReport {
    /// Whether every item went through.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn error(
        &mut self,
        kind: ItemErrorKind,
        target: impl fmt::Display,
        message: impl fmt::Display,
    ) {
        let error = ItemError::new(kind, target, message);
        tracing::warn!(kind = %error.kind, target = %error.target, error = %error.message, "sync item failed");
        self.errors.push(error);
    }

    /// One-line summary of the item failures, if any.
    #[must_use]
    pub fn error_summary(&self) -> Option<String> {
        let first = self.errors.first()?;
        Some(match self.errors.len() {
            1 => format!("1 item failed: {first}"),
            n => format!("{n} items failed, first: {first}"),
        })
    }
}
