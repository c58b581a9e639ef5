// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Path rules for locating task collections.
//!
//! Servers disagree on where task collections live: directly under the
//! configured root, under a per-user segment, or behind an implementation
//! prefix such as `/remote.php/dav/`. Matching is therefore tolerant: a
//! listed child is accepted when its path contains the configured root as a
//! run of whole segments, wherever that run starts.

use crate::types::Href;

/// File extension of task resources.
pub const TASK_EXTENSION: &str = "ics";

/// Containers that never hold tasks (scheduling inbox/outbox, principals, ...).
const SYSTEM_CONTAINERS: &[&str] = &[
    "inbox",
    "outbox",
    "principals",
    "principal",
    "notifications",
    "notification",
    "freebusy",
    "dropbox",
];

/// Path segments that belong to a server's layout rather than naming a list.
const LAYOUT_SEGMENTS: &[&str] = &[
    "remote.php",
    "dav",
    "dav.php",
    "caldav",
    "caldav.php",
    "cal.php",
    "calendars",
];

/// Display name used when a path has no segment left to name it by.
const DEFAULT_NAME: &str = "Tasks";

/// Reduces an href to its path, dropping scheme and host if present.
#[must_use]
pub fn href_path(href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        if let Ok(url) = reqwest::Url::parse(href) {
            return url.path().to_string();
        }
    }
    href.to_string()
}

/// Normalizes a collection path: leading and trailing `/`, no empty segments.
///
/// ```
/// use tasksync_caldav::discovery::normalize_collection;
///
/// assert_eq!(normalize_collection("calendars//alice").as_str(), "/calendars/alice/");
/// assert_eq!(normalize_collection("").as_str(), "/");
/// ```
#[must_use]
pub fn normalize_collection(path: &str) -> Href {
    let path = href_path(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        Href::from("/")
    } else {
        Href::new(format!("/{}/", segments.join("/")))
    }
}

/// Whether the last segment of `path` is a scheduling or principal container.
#[must_use]
pub fn is_system_container(path: &str) -> bool {
    let path = href_path(path);
    if path.contains("/principals/") {
        return true;
    }
    path.split('/')
        .rfind(|s| !s.is_empty())
        .is_some_and(|last| SYSTEM_CONTAINERS.contains(&last.to_ascii_lowercase().as_str()))
}

/// Whether `path` names a task resource rather than a collection.
#[must_use]
pub fn is_task_resource(path: &str) -> bool {
    let path = href_path(path);
    std::path::Path::new(path.trim_end_matches('/'))
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TASK_EXTENSION))
}

/// Decides whether a child listed under `root` is a task collection.
///
/// The candidate is rejected when it is the root itself (possibly behind an
/// implementation prefix), a task resource, or a system container. Otherwise
/// it is accepted when it contains the root's segments, which also covers the
/// common case of starting with the root.
///
/// ```
/// use tasksync_caldav::discovery::is_task_collection;
///
/// let root = "/calendars/alice/";
/// assert!(is_task_collection("/calendars/alice/tasks/", root));
/// assert!(is_task_collection("/dav.php/calendars/alice/tasks/", root));
/// assert!(!is_task_collection("/calendars/alice/", root));
/// assert!(!is_task_collection("/calendars/alice/inbox/", root));
/// assert!(!is_task_collection("/calendars/alice/1234.ics", root));
/// assert!(!is_task_collection("/calendars/bob/tasks/", root));
/// ```
#[must_use]
pub fn is_task_collection(candidate: &str, root: &str) -> bool {
    if is_task_resource(candidate) || is_system_container(candidate) {
        return false;
    }

    let candidate = normalize_collection(candidate);
    let root = normalize_collection(root);
    if candidate == root {
        return false;
    }
    if root.as_str() == "/" {
        return true;
    }
    if candidate.ends_with(root.as_str()) {
        return false;
    }
    candidate.contains(root.as_str())
}

/// Derives a display name from the last segment of `path` that is not part of
/// the server layout.
///
/// ```
/// use tasksync_caldav::discovery::collection_name;
///
/// assert_eq!(collection_name("/calendars/alice/home%20chores/"), "home chores");
/// assert_eq!(collection_name("/remote.php/dav/calendars/"), "Tasks");
/// ```
#[must_use]
pub fn collection_name(path: &str) -> String {
    href_path(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .rfind(|s| {
            let lower = s.to_ascii_lowercase();
            !LAYOUT_SEGMENTS.contains(&lower.as_str()) && !SYSTEM_CONTAINERS.contains(&lower.as_str())
        })
        .map_or_else(|| DEFAULT_NAME.to_string(), percent_decode)
}

/// Builds the href of the resource holding the task `uid` in `collection`.
///
/// ```
/// use tasksync_caldav::Href;
/// use tasksync_caldav::discovery::task_href;
///
/// let href = task_href(&Href::from("/cal/home"), "a b@example.com");
/// assert_eq!(href.as_str(), "/cal/home/a%20b@example.com.ics");
/// ```
#[must_use]
pub fn task_href(collection: &Href, uid: &str) -> Href {
    let collection = normalize_collection(collection);
    Href::new(format!("{collection}{}.{TASK_EXTENSION}", percent_encode(uid)))
}

fn percent_encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'@') {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        if b == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(decoded) = hex {
                out.push(decoded);
                i += 3;
                continue;
            }
        }
        out.push(b);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
