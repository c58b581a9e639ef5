// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use jiff::Timestamp;
use tasksync_caldav::Href;

/// Local identifier of a task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct CollectionId(pub i64);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A local task list backed by a remote collection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Collection {
    /// Local identifier.
    pub id: CollectionId,
    /// Server-relative path of the remote collection, ending in `/`.
    #[serde(serialize_with = "serialize_href")]
    pub path: Href,
    /// Display name, derived from the path.
    pub name: String,
}

fn serialize_href<S: serde::Serializer>(href: &Href, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(href.as_str())
}

/// A locally deleted task whose uid must not be recreated from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tombstone {
    /// The list the task was deleted from.
    pub collection_id: CollectionId,
    /// The uid of the deleted task.
    pub uid: String,
    /// When the task was deleted.
    pub deleted_at: Timestamp,
}

impl Tombstone {
    /// Whether the tombstone still suppresses the uid, given the oldest
    /// deletion time that is still retained.
    #[must_use]
    pub fn is_live(&self, cutoff: Timestamp) -> bool {
        self.deleted_at > cutoff
    }
}
