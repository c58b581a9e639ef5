// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `SQLite` implementation of [`LocalStore`].

mod collections;
mod sync_state;
mod tasks;
mod tombstones;


use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tasksync_caldav::Href;

use crate::collection::{Collection, CollectionId, Tombstone};
use crate::error::StoreError;
use crate::localdb::collections::Collections;
use crate::localdb::sync_state::{SyncStateRecord, SyncStates};
use crate::localdb::tasks::{TaskRecord, Tasks};
use crate::localdb::tombstones::Tombstones;
use crate::state::SyncState;
use crate::store::LocalStore;
use crate::task::{LocalTask, NewTask, TaskId};

/// Gives every in-memory database its own shared-cache name.
pub(crate) static IN_MEMORY_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A [`LocalStore`] backed by a `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,

    collections: Collections,
    tasks: Tasks,
    tombstones: Tombstones,
    sync_state: SyncStates,
}

impl SqliteStore {
    /// Opens a sqlite database and brings its schema up to date.
    /// If `filename` is `None`, it opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created, opened or migrated.
    pub async fn open(filename: Option<&Path>) -> Result<Self, StoreError> {
        let (options, pool_options) = if let Some(filename) = filename {
            tracing::info!(path = %filename.display(), "connecting to SQLite database");
            if let Some(parent) = filename.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }

            let options = SqliteConnectOptions::new()
                .filename(filename)
                .create_if_missing(true);
            (options, SqlitePoolOptions::new())
        } else {
            tracing::info!("connecting to in-memory SQLite database");
            let db_id = IN_MEMORY_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
            let options = SqliteConnectOptions::new()
                .filename(format!("file:memdb_{db_id}:?mode=memory&cache=shared"))
                .in_memory(true)
                .create_if_missing(true);

            // the database lives only as long as one connection stays open
            let pool_options = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
            (options, pool_options)
        };

        let pool = pool_options.connect_with(options).await?;

        sqlx::migrate!("src/localdb/migrations") // relative path from the crate root
            .run(&pool)
            .await?;

        tracing::debug!("database schema is up to date");
        Ok(Self {
            collections: Collections::new(pool.clone()),
            tasks: Tasks::new(pool.clone()),
            tombstones: Tombstones::new(pool.clone()),
            sync_state: SyncStates::new(pool.clone()),
            pool,
        })
    }

    /// Closes every connection of the pool.
    pub async fn close(self) {
        tracing::debug!("closing database connection");
        self.pool.close().await;
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn list_collections(&self) -> Result<Vec<Collection>, StoreError> {
        let records = self.collections.list().await?;
        Ok(records.into_iter().map(Collection::from).collect())
    }

    async fn create_collection(&self, path: &Href, name: &str) -> Result<Collection, StoreError> {
        let record = self.collections.get_or_insert(path, name).await?;
        Ok(record.into())
    }

    async fn retire_collection(&self, id: CollectionId) -> Result<Vec<LocalTask>, StoreError> {
        let mut removed = self.list_tasks(id).await?;
        for task in &mut removed {
            task.deleted = true;
            task.dirty = false;
        }

        // the rows cannot outlive their collection, so the soft delete is purged at once
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM tasks WHERE collection_id = ?;")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tombstones WHERE collection_id = ?;")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM collections WHERE id = ?;")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::CollectionNotFound(id));
        }
        tx.commit().await?;

        Ok(removed)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<LocalTask>, StoreError> {
        self.tasks
            .get(id.0)
            .await?
            .map(LocalTask::try_from)
            .transpose()
    }

    async fn list_tasks(&self, collection: CollectionId) -> Result<Vec<LocalTask>, StoreError> {
        self.tasks
            .list_by_collection(collection.0)
            .await?
            .into_iter()
            .map(LocalTask::try_from)
            .collect()
    }

    async fn list_dirty_tasks(&self) -> Result<Vec<LocalTask>, StoreError> {
        self.tasks
            .list_dirty()
            .await?
            .into_iter()
            .map(LocalTask::try_from)
            .collect()
    }

    async fn insert_task(&self, task: NewTask) -> Result<LocalTask, StoreError> {
        if !self.collections.exists(task.collection_id.0).await? {
            return Err(StoreError::CollectionNotFound(task.collection_id));
        }

        let record = TaskRecord::from_new(task.clone())?;
        let id = self
            .tasks
            .insert(&record)
            .await
            .map_err(|e| uid_conflict(e, task.collection_id, task.uid.as_deref()))?;
        Ok(task.into_task(TaskId(id)))
    }

    async fn save_task(&self, task: &LocalTask) -> Result<(), StoreError> {
        let record = TaskRecord::from_task(task)?;
        let updated = self
            .tasks
            .update(&record)
            .await
            .map_err(|e| uid_conflict(e, task.collection_id, task.uid.as_deref()))?;
        if updated {
            Ok(())
        } else {
            Err(StoreError::TaskNotFound(task.id))
        }
    }

    async fn purge_deleted_tasks(&self) -> Result<u64, StoreError> {
        Ok(self.tasks.delete_pushed_deletions().await?)
    }

    async fn put_tombstone(&self, tombstone: &Tombstone) -> Result<(), StoreError> {
        self.tombstones
            .upsert(
                tombstone.collection_id.0,
                &tombstone.uid,
                tombstone.deleted_at.as_millisecond(),
            )
            .await?;
        Ok(())
    }

    async fn get_tombstone(
        &self,
        collection: CollectionId,
        uid: &str,
    ) -> Result<Option<Tombstone>, StoreError> {
        let Some(deleted_at) = self.tombstones.get(collection.0, uid).await? else {
            return Ok(None);
        };

        Ok(Some(Tombstone {
            collection_id: collection,
            uid: uid.to_string(),
            deleted_at: timestamp("deleted_at", deleted_at)?,
        }))
    }

    async fn prune_tombstones(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        Ok(self.tombstones.delete_until(cutoff.as_millisecond()).await?)
    }

    async fn sync_state(&self) -> Result<SyncState, StoreError> {
        let record = self.sync_state.get().await?.unwrap_or_default();
        Ok(SyncState {
            last_attempt: record
                .last_attempt
                .map(|ms| timestamp("last_attempt", ms))
                .transpose()?,
            last_success: record
                .last_success
                .map(|ms| timestamp("last_success", ms))
                .transpose()?,
            last_error: record.last_error,
        })
    }

    async fn save_sync_state(&self, state: &SyncState) -> Result<(), StoreError> {
        let record = SyncStateRecord {
            last_attempt: state.last_attempt.map(Timestamp::as_millisecond),
            last_success: state.last_success.map(Timestamp::as_millisecond),
            last_error: state.last_error.clone(),
        };
        Ok(self.sync_state.upsert(&record).await?)
    }
}

/// Maps a hit on the `(collection_id, uid)` index to [`StoreError::DuplicateUid`].
fn uid_conflict(err: sqlx::Error, collection: CollectionId, uid: Option<&str>) -> StoreError {
    match (&err, uid) {
        (sqlx::Error::Database(db), Some(uid)) if db.is_unique_violation() => {
            StoreError::DuplicateUid {
                collection,
                uid: uid.to_string(),
            }
        }
        _ => err.into(),
    }
}

fn timestamp(field: &'static str, ms: i64) -> Result<Timestamp, StoreError> {
    Timestamp::from_millisecond(ms).map_err(|_| StoreError::Corrupt {
        field,
        value: ms.to_string(),
    })
}
