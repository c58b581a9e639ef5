// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Test data factories for integration tests.

use std::sync::Arc;

use jiff::Timestamp;
use jiff::civil::date;
use tasksync_core::{
    Collection, LocalStore, LocalTask, MemoryStore, SyncEngine, SyncEvent, SyncOptions, TaskData,
    TaskStatus,
};
use tasksync_ical::VTodo;
use tokio::sync::broadcast;

use super::fake_remote::FakeRemote;

/// An engine wired to a fresh [`MemoryStore`] and the given fake server.
pub struct TestEngine {
    pub engine: Arc<SyncEngine>,
    pub store: Arc<MemoryStore>,
    pub remote: Arc<FakeRemote>,
}

#[allow(dead_code)]
impl TestEngine {
    pub fn new(remote: FakeRemote) -> Self {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(remote);
        let engine = SyncEngine::new(
            Arc::clone(&store) as Arc<dyn LocalStore>,
            Arc::clone(&remote) as _,
            SyncOptions::default(),
        );
        Self {
            engine: Arc::new(engine),
            store,
            remote,
        }
    }

    /// The local list backed by `path`.
    pub async fn collection(&self, path: &str) -> Collection {
        self.store
            .list_collections()
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.path.as_str() == path)
            .unwrap_or_else(|| panic!("no local collection for {path}"))
    }

    /// Paths of every local list, sorted.
    pub async fn collection_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self
            .store
            .list_collections()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.path.to_string())
            .collect();
        paths.sort();
        paths
    }

    /// Every task of the list backed by `path`.
    pub async fn tasks(&self, path: &str) -> Vec<LocalTask> {
        let collection = self.collection(path).await;
        self.store.list_tasks(collection.id).await.unwrap()
    }

    /// The task with `uid` in the list backed by `path`.
    pub async fn task(&self, path: &str, uid: &str) -> Option<LocalTask> {
        self.tasks(path)
            .await
            .into_iter()
            .find(|t| t.uid.as_deref() == Some(uid))
    }
}

/// Drains every event received so far.
#[allow(dead_code)]
pub fn drain(events: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    received
}

/// The task of the "Buy milk" scenario.
#[allow(dead_code)]
pub fn buy_milk() -> TaskData {
    TaskData {
        due: Some(date(2024, 1, 15).at(17, 0, 0, 0)),
        status: TaskStatus::Pending,
        ..TaskData::new("Buy milk")
    }
}

/// A to-do as another client would write it.
#[allow(dead_code)]
pub fn remote_todo(uid: &str, summary: &str) -> VTodo {
    VTodo {
        due: Some(date(2024, 2, 1).at(9, 30, 0, 0)),
        priority: Some(3),
        ..VTodo::new(uid, summary)
    }
}

/// A fixed point in time for passes that deal with tombstone expiry.
#[allow(dead_code)]
pub fn at(s: &str) -> Timestamp {
    s.parse().expect("invalid timestamp")
}
