// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Local deletions against a server that still lists the task.

use tasksync_core::{LocalStore, TaskData, Tombstone, create_task, delete_task};

use crate::common::{Call, FakeRemote, TestEngine, at, remote_todo};

const HOME: &str = "/cal/home/";

/// A pulled task deleted locally at `2024-03-01T10:00:00Z`, on a server
/// that accepts the deletion but keeps listing the resource.
async fn deleted_on_lagging_server() -> TestEngine {
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.remote.insert(HOME, remote_todo("r1", "Old errand"));
    t.engine.sync_at(at("2024-03-01T09:00:00Z")).await.unwrap();

    let task = t.task(HOME, "r1").await.unwrap();
    delete_task(t.store.as_ref(), task.id, at("2024-03-01T10:00:00Z"))
        .await
        .unwrap();
    t.remote.ignore_deletes();
    t
}

#[tokio::test]
async fn tombstone_suppresses_remote_copy_within_retention() {
    // Arrange
    let t = deleted_on_lagging_server().await;
    let home = t.collection(HOME).await;

    // Act
    let report = t.engine.sync_at(at("2024-03-01T10:00:05Z")).await.unwrap();

    // Assert
    assert_eq!(report.pushed_deleted, 1);
    assert_eq!(report.pulled_suppressed, 1);
    assert_eq!(report.tasks_purged, 1);
    assert_eq!(
        t.remote
            .count_calls(|c| matches!(c, Call::Delete(_, uid) if uid == "r1")),
        1
    );
    assert!(t.tasks(HOME).await.is_empty());
    assert!(
        t.store
            .get_tombstone(home.id, "r1")
            .await
            .unwrap()
            .is_some()
    );

    // Act: the server keeps listing it a couple of hours later
    let report = t.engine.sync_at(at("2024-03-01T12:00:00Z")).await.unwrap();

    // Assert
    assert_eq!(report.pulled_suppressed, 1);
    assert_eq!(report.pulled_created, 0);
    assert!(t.tasks(HOME).await.is_empty());
}

#[tokio::test]
async fn remote_copy_returns_after_tombstone_expires() {
    // Arrange
    let t = deleted_on_lagging_server().await;
    t.engine.sync_at(at("2024-03-01T10:00:05Z")).await.unwrap();

    // Act: 25 hours after the deletion
    let report = t.engine.sync_at(at("2024-03-02T11:00:00Z")).await.unwrap();

    // Assert
    assert_eq!(report.tombstones_pruned, 1);
    assert_eq!(report.pulled_created, 1);
    let task = t.task(HOME, "r1").await.expect("task recreated from server");
    assert_eq!(task.data.title, "Old errand");
    assert!(!task.dirty && !task.deleted);
}

#[tokio::test]
async fn tombstones_pruned_at_start_of_pass() {
    // Arrange
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.engine.sync_at(at("2024-03-01T00:00:00Z")).await.unwrap();
    let home = t.collection(HOME).await;
    for (uid, deleted_at) in [
        ("old", "2024-03-01T00:00:00Z"),
        ("edge", "2024-03-01T12:00:00Z"),
        ("recent", "2024-03-02T06:00:00Z"),
    ] {
        let tombstone = Tombstone {
            collection_id: home.id,
            uid: uid.into(),
            deleted_at: at(deleted_at),
        };
        t.store.put_tombstone(&tombstone).await.unwrap();
    }

    // Act: the cutoff is exactly the deletion time of "edge"
    let report = t.engine.sync_at(at("2024-03-02T12:00:00Z")).await.unwrap();

    // Assert
    assert_eq!(report.tombstones_pruned, 2);
    for (uid, kept) in [("old", false), ("edge", false), ("recent", true)] {
        let found = t.store.get_tombstone(home.id, uid).await.unwrap();
        assert_eq!(found.is_some(), kept, "tombstone {uid}");
    }
}

#[tokio::test]
async fn deleting_unpushed_task_leaves_no_tombstone() {
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.engine.sync().await.unwrap();
    let home = t.collection(HOME).await;
    let task = create_task(t.store.as_ref(), home.id, TaskData::new("Never sent"))
        .await
        .unwrap();

    let deleted = delete_task(t.store.as_ref(), task.id, at("2024-03-01T10:00:00Z"))
        .await
        .unwrap();

    assert!(deleted.deleted && deleted.dirty);
    assert_eq!(deleted.uid, None);
    let report = t.engine.sync_at(at("2024-03-01T10:00:01Z")).await.unwrap();
    assert_eq!(report.tombstones_pruned, 0);
    assert_eq!(report.tasks_purged, 1);
}
