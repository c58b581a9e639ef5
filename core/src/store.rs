// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The local store seam and the task operations built on it.
//!
//! The sync engine only talks to [`LocalStore`]. Each call is committed on its
//! own, so a pass that stops half way leaves every finished item in place.

use async_trait::async_trait;
use jiff::Timestamp;
use tasksync_caldav::Href;

use crate::collection::{Collection, CollectionId, Tombstone};
use crate::error::StoreError;
use crate::state::SyncState;
use crate::task::{LocalTask, NewTask, TaskData, TaskId};

/// Persistence used by the sync engine.
#[async_trait]
pub trait LocalStore: Send + Sync + std::fmt::Debug {
    /// Lists every collection-backed task list.
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError>;

    /// Creates a task list for the collection at `path`.
    async fn create_collection(&self, path: &Href, name: &str) -> Result<Collection, StoreError>;

    /// Removes a task list together with its tasks and tombstones, returning
    /// the removed tasks marked deleted.
    async fn retire_collection(&self, id: CollectionId) -> Result<Vec<LocalTask>, StoreError>;

    /// Gets a task by id, deleted or not.
    async fn get_task(&self, id: TaskId) -> Result<Option<LocalTask>, StoreError>;

    /// Lists every task of a collection, deleted ones included.
    async fn list_tasks(&self, collection: CollectionId) -> Result<Vec<LocalTask>, StoreError>;

    /// Lists every task with unpushed changes.
    async fn list_dirty_tasks(&self) -> Result<Vec<LocalTask>, StoreError>;

    /// Inserts a task and returns it with its new id.
    async fn insert_task(&self, task: NewTask) -> Result<LocalTask, StoreError>;

    /// Overwrites a stored task.
    async fn save_task(&self, task: &LocalTask) -> Result<(), StoreError>;

    /// Removes every deleted task whose deletion has been pushed.
    async fn purge_deleted_tasks(&self) -> Result<u64, StoreError>;

    /// Records (or refreshes) a tombstone.
    async fn put_tombstone(&self, tombstone: &Tombstone) -> Result<(), StoreError>;

    /// Gets the tombstone for `uid` in a collection.
    async fn get_tombstone(
        &self,
        collection: CollectionId,
        uid: &str,
    ) -> Result<Option<Tombstone>, StoreError>;

    /// Drops tombstones recorded at or before `cutoff`.
    async fn prune_tombstones(&self, cutoff: Timestamp) -> Result<u64, StoreError>;

    /// Reads the sync state.
    async fn sync_state(&self) -> Result<SyncState, StoreError>;

    /// Writes the sync state.
    async fn save_sync_state(&self, state: &SyncState) -> Result<(), StoreError>;
}

/// Adds a task to a list. The task is pushed on the next pass.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn create_task<S: LocalStore + ?Sized>(
    store: &S,
    collection: CollectionId,
    data: TaskData,
) -> Result<LocalTask, StoreError> {
    let task = store.insert_task(NewTask::local(collection, data)).await?;
    tracing::debug!(id = %task.id, collection = %collection, "created task");
    Ok(task)
}

/// Replaces the content of a task. The change is pushed on the next pass.
///
/// # Errors
///
/// Returns an error if the task does not exist, is deleted, or the store fails.
pub async fn update_task<S: LocalStore + ?Sized>(
    store: &S,
    id: TaskId,
    data: TaskData,
) -> Result<LocalTask, StoreError> {
    let mut task = store
        .get_task(id)
        .await?
        .filter(|t| !t.deleted)
        .ok_or(StoreError::TaskNotFound(id))?;

    task.data = data;
    task.dirty = true;
    store.save_task(&task).await?;
    tracing::debug!(id = %id, "updated task");
    Ok(task)
}

/// Deletes a task. The task stays as a dirty, deleted record until its
/// deletion is pushed, and a tombstone keeps the next pull from recreating it.
///
/// # Errors
///
/// Returns an error if the task does not exist or the store fails.
pub async fn delete_task<S: LocalStore + ?Sized>(
    store: &S,
    id: TaskId,
    now: Timestamp,
) -> Result<LocalTask, StoreError> {
    let mut task = store.get_task(id).await?.ok_or(StoreError::TaskNotFound(id))?;
    if task.deleted {
        return Ok(task);
    }

    if let Some(uid) = &task.uid {
        let tombstone = Tombstone {
            collection_id: task.collection_id,
            uid: uid.clone(),
            deleted_at: now,
        };
        store.put_tombstone(&tombstone).await?;
    }

    task.deleted = true;
    task.dirty = true;
    store.save_task(&task).await?;
    tracing::debug!(id = %id, uid = ?task.uid, "deleted task");
    Ok(task)
}
