// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use jiff::Timestamp;
use tasksync_ical::VTodo;

/// Resource href (path).
///
/// A `Href` represents the server-relative path of a collection or a task
/// resource on a `CalDAV` server, such as `/calendars/user/tasks/1234.ics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Href(String);

impl Href {
    /// Creates a new `Href` from a string.
    #[must_use]
    pub const fn new(href: String) -> Self {
        Self(href)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Href {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Href {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Href {
    fn from(href: String) -> Self {
        Self(href)
    }
}

impl From<&str> for Href {
    fn from(href: &str) -> Self {
        Self(href.to_string())
    }
}

/// Entity tag for change detection.
///
/// An `ETag` represents an entity tag returned by the `CalDAV` server. It
/// changes whenever the resource content changes and is compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ETag(String);

impl ETag {
    /// Creates a new `ETag` from a string.
    #[must_use]
    pub const fn new(etag: String) -> Self {
        Self(etag)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ETag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ETag {
    fn from(etag: String) -> Self {
        Self(etag)
    }
}

impl From<&str> for ETag {
    fn from(etag: &str) -> Self {
        Self(etag.to_string())
    }
}

/// A task resource read from a collection.
#[derive(Debug, Clone)]
pub struct RemoteTask {
    /// The href the resource was read from.
    pub href: Href,
    /// The entity tag of the resource, if the server reported one.
    pub etag: Option<ETag>,
    /// Last modification time reported by the server.
    pub last_modified: Option<Timestamp>,
    /// The parsed to-do.
    pub todo: VTodo,
}

impl RemoteTask {
    /// The uid of the to-do.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.todo.uid
    }
}

/// A resource dropped while fetching a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedResource {
    /// The href of the dropped resource.
    pub href: Href,
    /// Why it was dropped.
    pub reason: String,
}

/// Result of fetching every task in one collection.
#[derive(Debug, Clone, Default)]
pub struct TaskFetch {
    /// Tasks that were parsed successfully.
    pub tasks: Vec<RemoteTask>,
    /// Resources without a usable body or uid.
    pub skipped: Vec<SkippedResource>,
}

/// A child collection found by a depth-1 listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    /// Normalized collection path, always ending in `/`.
    pub href: Href,
    /// Display name reported by the server, if any.
    pub display_name: Option<String>,
}

/// How a discovery result was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoverySource {
    /// Collections were listed under the configured root.
    Root,
    /// The configured root listed nothing; collections came from the server root.
    ServerRoot,
    /// Nothing was listed anywhere; the configured root is the sole collection.
    Fallback,
    /// Discovery failed; the configured root is the sole collection.
    Failed(String),
}

/// Task collections located on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Collection paths, each ending in `/`.
    pub collections: Vec<Href>,
    /// Display names the server reported, keyed by collection path.
    pub display_names: BTreeMap<Href, String>,
    /// How the paths were obtained.
    pub source: DiscoverySource,
}

impl Discovery {
    /// The server's display name for `collection`, or one derived from its path.
    #[must_use]
    pub fn display_name(&self, collection: &Href) -> String {
        self.display_names
            .get(collection)
            .cloned()
            .unwrap_or_else(|| crate::discovery::collection_name(collection))
    }

    /// Whether the server actually answered the listing. A failed discovery
    /// only carries the fallback collection and says nothing about which
    /// collections have disappeared.
    #[must_use]
    pub const fn is_authoritative(&self) -> bool {
        !matches!(self.source, DiscoverySource::Failed(_))
    }
}
