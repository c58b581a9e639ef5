// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use jiff::Timestamp;
use jiff::civil::DateTime;
use tasksync_ical::{TodoStatus, VTodo};

use crate::collection::CollectionId;

/// Local identifier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
    /// Given up.
    Cancelled,
}

impl TaskStatus {
    /// The stable name used in the local store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Reads a stored status name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TodoStatus> for TaskStatus {
    fn from(status: TodoStatus) -> Self {
        match status {
            TodoStatus::NeedsAction => Self::Pending,
            TodoStatus::InProcess => Self::InProgress,
            TodoStatus::Completed => Self::Completed,
            TodoStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<TaskStatus> for TodoStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => Self::NeedsAction,
            TaskStatus::InProgress => Self::InProcess,
            TaskStatus::Completed => Self::Completed,
            TaskStatus::Cancelled => Self::Cancelled,
        }
    }
}

/// Highest local priority that survives a round trip through the wire.
pub const MAX_PRIORITY: u8 = 5;

/// Maps a local priority to the wire value: doubled and clamped to `1..=9`.
/// Zero means "no priority" and is not written.
#[must_use]
pub fn priority_to_wire(priority: u8) -> Option<u8> {
    (priority > 0).then(|| priority.saturating_mul(2).clamp(1, 9))
}

/// Maps a wire priority back to the local scale.
#[must_use]
pub fn priority_from_wire(priority: Option<u8>) -> u8 {
    match priority {
        Some(p) if p > 0 => p.min(9).div_ceil(2),
        _ => 0,
    }
}

/// The user-facing content of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TaskData {
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: Option<String>,
    /// Where the task takes place.
    pub location: Option<String>,
    /// Related link.
    pub url: Option<String>,
    /// Organizer, usually a `mailto:` URI.
    pub organizer: Option<String>,
    /// Local priority, `0` for none.
    pub priority: u8,
    /// Current status.
    pub status: TaskStatus,
    /// Floating start time.
    pub start: Option<DateTime>,
    /// Floating due time.
    pub due: Option<DateTime>,
    /// Floating completion time.
    pub completed: Option<DateTime>,
    /// Floating creation time.
    pub created: Option<DateTime>,
    /// Percent complete, `0..=100`.
    pub percent_complete: u8,
    /// Free-text categories.
    pub categories: Vec<String>,
}

impl TaskData {
    /// Creates task content with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Reads the content of a parsed to-do.
    #[must_use]
    pub fn from_vtodo(todo: &VTodo) -> Self {
        Self {
            title: todo.summary.clone(),
            description: todo.description.clone(),
            location: todo.location.clone(),
            url: todo.url.clone(),
            organizer: todo.organizer.clone(),
            priority: priority_from_wire(todo.priority),
            status: todo.status.into(),
            start: todo.dt_start,
            due: todo.due,
            completed: todo.completed,
            created: todo.created,
            percent_complete: todo.percent_complete.min(100),
            categories: todo.categories.clone(),
        }
    }

    /// Builds the to-do written for this content under `uid`.
    #[must_use]
    pub fn to_vtodo(&self, uid: &str) -> VTodo {
        VTodo {
            uid: uid.to_string(),
            summary: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            url: self.url.clone(),
            organizer: self.organizer.clone(),
            priority: priority_to_wire(self.priority),
            status: self.status.into(),
            dt_start: self.start,
            due: self.due,
            created: self.created,
            completed: self.completed,
            last_modified: None,
            percent_complete: self.percent_complete.min(100),
            categories: self.categories.clone(),
        }
    }
}

/// A task held by the local store.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LocalTask {
    /// Local identifier.
    pub id: TaskId,
    /// The list the task belongs to.
    pub collection_id: CollectionId,
    /// Identity shared with the server, assigned on first push.
    pub uid: Option<String>,
    /// User-facing content.
    pub data: TaskData,
    /// Entity tag of the last known remote revision.
    pub etag: Option<String>,
    /// Last modification time reported by the server.
    pub remote_modified: Option<Timestamp>,
    /// Whether the task has changes not pushed yet.
    pub dirty: bool,
    /// Whether the task is deleted locally and waiting to be purged.
    pub deleted: bool,
}

impl LocalTask {
    /// Whether the server holds a copy of this task, as far as we know.
    #[must_use]
    pub fn is_known_remotely(&self) -> bool {
        self.uid.is_some() && self.etag.is_some()
    }
}

/// A task to insert into the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// The list the task belongs to.
    pub collection_id: CollectionId,
    /// Identity shared with the server, if any.
    pub uid: Option<String>,
    /// User-facing content.
    pub data: TaskData,
    /// Entity tag of the remote revision the task was read from.
    pub etag: Option<String>,
    /// Last modification time reported by the server.
    pub remote_modified: Option<Timestamp>,
    /// Whether the task has changes not pushed yet.
    pub dirty: bool,
}

impl NewTask {
    /// A task created locally, waiting for its first push.
    #[must_use]
    pub fn local(collection_id: CollectionId, data: TaskData) -> Self {
        Self {
            collection_id,
            uid: None,
            data,
            etag: None,
            remote_modified: None,
            dirty: true,
        }
    }

    /// A task read from the server.
    #[must_use]
    pub fn remote(
        collection_id: CollectionId,
        todo: &VTodo,
        etag: Option<String>,
        remote_modified: Option<Timestamp>,
    ) -> Self {
        Self {
            collection_id,
            uid: Some(todo.uid.clone()),
            data: TaskData::from_vtodo(todo),
            etag,
            remote_modified,
            dirty: false,
        }
    }

    /// Turns the draft into a stored task with the given id.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> LocalTask {
        LocalTask {
            id,
            collection_id: self.collection_id,
            uid: self.uid,
            data: self.data,
            etag: self.etag,
            remote_modified: self.remote_modified,
            dirty: self.dirty,
            deleted: false,
        }
    }
}
