// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use tasksync_caldav::{CalDavClient, CalDavError, Discovery, ETag, Href, TaskFetch};
use tasksync_ical::VTodo;

/// The server side of a sync pass.
#[async_trait]
pub trait RemoteRepository: Send + Sync + std::fmt::Debug {
    /// Lists the task collections to sync. Never fails; a failure is reported
    /// through [`Discovery::source`].
    async fn discover(&self) -> Discovery;

    /// Reads every task of a collection.
    async fn fetch_all(&self, collection: &Href) -> Result<TaskFetch, CalDavError>;

    /// Creates or replaces a task, returning its new entity tag.
    async fn put(&self, collection: &Href, todo: &VTodo) -> Result<ETag, CalDavError>;

    /// Deletes a task. A task that is already gone counts as deleted.
    async fn delete(&self, collection: &Href, uid: &str) -> Result<(), CalDavError>;
}

#[async_trait]
impl RemoteRepository for CalDavClient {
    async fn discover(&self) -> Discovery {
        self.discover_collections().await
    }

    async fn fetch_all(&self, collection: &Href) -> Result<TaskFetch, CalDavError> {
        self.fetch_tasks(collection).await
    }

    async fn put(&self, collection: &Href, todo: &VTodo) -> Result<ETag, CalDavError> {
        self.put_task(collection, todo).await
    }

    async fn delete(&self, collection: &Href, uid: &str) -> Result<(), CalDavError> {
        self.delete_task(collection, uid).await
    }
}
