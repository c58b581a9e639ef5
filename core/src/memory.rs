// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use async_trait::async_trait;
use jiff::Timestamp;
use tasksync_caldav::Href;
use tokio::sync::Mutex;

use crate::collection::{Collection, CollectionId, Tombstone};
use crate::error::StoreError;
use crate::state::SyncState;
use crate::store::LocalStore;
use crate::task::{LocalTask, NewTask, TaskId};

/// A [`LocalStore`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    collections: BTreeMap<CollectionId, Collection>,
    tasks: BTreeMap<TaskId, LocalTask>,
    tombstones: BTreeMap<(CollectionId, String), Timestamp>,
    state: SyncState,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Rejects a uid already held by another task of the same collection.
    fn check_uid(
        &self,
        id: Option<TaskId>,
        collection: CollectionId,
        uid: Option<&str>,
    ) -> Result<(), StoreError> {
        let Some(uid) = uid else {
            return Ok(());
        };
        let taken = self.tasks.values().any(|t| {
            Some(t.id) != id && t.collection_id == collection && t.uid.as_deref() == Some(uid)
        });
        if taken {
            return Err(StoreError::DuplicateUid {
                collection,
                uid: uid.to_string(),
            });
        }
        Ok(())
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        Ok(self.inner.lock().await.collections.values().cloned().collect())
    }

    async fn create_collection(&self, path: &Href, name: &str) -> Result<Collection, StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.collections.values().find(|c| &c.path == path) {
            return Ok(existing.clone());
        }

        let collection = Collection {
            id: CollectionId(inner.next_id()),
            path: path.clone(),
            name: name.to_string(),
        };
        inner.collections.insert(collection.id, collection.clone());
        Ok(collection)
    }

    async fn retire_collection(&self, id: CollectionId) -> Result<Vec<LocalTask>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .collections
            .remove(&id)
            .ok_or(StoreError::CollectionNotFound(id))?;

        let (mut removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut inner.tasks)
            .into_values()
            .partition(|t| t.collection_id == id);
        inner.tasks = kept.into_iter().map(|t| (t.id, t)).collect();
        for task in &mut removed {
            task.deleted = true;
            task.dirty = false;
        }
        inner.tombstones.retain(|(collection, _), _| *collection != id);
        Ok(removed)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<LocalTask>, StoreError> {
        Ok(self.inner.lock().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, collection: CollectionId) -> Result<Vec<LocalTask>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tasks
            .values()
            .filter(|t| t.collection_id == collection)
            .cloned()
            .collect())
    }

    async fn list_dirty_tasks(&self) -> Result<Vec<LocalTask>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.tasks.values().filter(|t| t.dirty).cloned().collect())
    }

    async fn insert_task(&self, task: NewTask) -> Result<LocalTask, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.collections.contains_key(&task.collection_id) {
            return Err(StoreError::CollectionNotFound(task.collection_id));
        }
        inner.check_uid(None, task.collection_id, task.uid.as_deref())?;

        let task = task.into_task(TaskId(inner.next_id()));
        inner.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn save_task(&self, task: &LocalTask) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_uid(Some(task.id), task.collection_id, task.uid.as_deref())?;
        let slot = inner
            .tasks
            .get_mut(&task.id)
            .ok_or(StoreError::TaskNotFound(task.id))?;
        *slot = task.clone();
        Ok(())
    }

    async fn purge_deleted_tasks(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|_, t| !(t.deleted && !t.dirty));
        Ok((before - inner.tasks.len()) as u64)
    }

    async fn put_tombstone(&self, tombstone: &Tombstone) -> Result<(), StoreError> {
        let key = (tombstone.collection_id, tombstone.uid.clone());
        self.inner
            .lock()
            .await
            .tombstones
            .insert(key, tombstone.deleted_at);
        Ok(())
    }

    async fn get_tombstone(
        &self,
        collection: CollectionId,
        uid: &str,
    ) -> Result<Option<Tombstone>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tombstones
            .get(&(collection, uid.to_string()))
            .map(|deleted_at| Tombstone {
                collection_id: collection,
                uid: uid.to_string(),
                deleted_at: *deleted_at,
            }))
    }

    async fn prune_tombstones(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.tombstones.len();
        inner.tombstones.retain(|_, deleted_at| *deleted_at > cutoff);
        Ok((before - inner.tombstones.len()) as u64)
    }

    async fn sync_state(&self) -> Result<SyncState, StoreError> {
        Ok(self.inner.lock().await.state.clone())
    }

    async fn save_sync_state(&self, state: &SyncState) -> Result<(), StoreError> {
        self.inner.lock().await.state = state.clone();
        Ok(())
    }
}
