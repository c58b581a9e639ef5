// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use tokio::sync::broadcast;

use crate::collection::{Collection, CollectionId};
use crate::task::{LocalTask, TaskId};

/// A change the sync engine applied to the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A task was created or replaced.
    TaskUpserted(LocalTask),
    /// A task was removed.
    TaskDeleted {
        /// Local id of the removed task.
        id: TaskId,
        /// The list it belonged to.
        collection_id: CollectionId,
        /// Its uid, if it had one.
        uid: Option<String>,
    },
    /// A task list was created for a newly discovered collection.
    CollectionCreated(Collection),
    /// A task list was removed because its collection disappeared.
    CollectionRetired(Collection),
}

impl SyncEvent {
    pub(crate) fn task_deleted(task: &LocalTask) -> Self {
        Self::TaskDeleted {
            id: task.id,
            collection_id: task.collection_id,
            uid: task.uid.clone(),
        }
    }
}

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out of [`SyncEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub(crate) struct EventBus {
    sender: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: SyncEvent) {
        // no subscribers is fine
        let _ = self.sender.send(event);
    }
}
