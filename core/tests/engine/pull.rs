// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::civil::date;
use tasksync_core::{
    ItemErrorKind, LocalStore, NewTask, SyncEvent, TaskData, TaskStatus, update_task,
};
use tasksync_ical::{TodoStatus, VTodo};

use crate::common::{FakeRemote, Failure, TestEngine, drain, remote_todo};

const HOME: &str = "/cal/home/";
const WORK: &str = "/cal/work/";

#[tokio::test]
async fn pull_creates_remote_tasks_as_clean() {
    // Arrange
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    let etag = t.remote.insert(HOME, remote_todo("r1", "Call plumber"));
    t.remote.insert(HOME, remote_todo("r2", "Water plants"));
    let mut events = t.engine.subscribe();

    // Act
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pulled_created, 2);
    assert!(report.is_clean());

    let task = t.task(HOME, "r1").await.expect("pulled task");
    assert!(!task.dirty);
    assert!(!task.deleted);
    assert_eq!(task.etag.as_deref(), Some(etag.as_str()));
    assert_eq!(task.data.title, "Call plumber");
    assert_eq!(task.data.priority, 2);
    assert_eq!(task.data.due, Some(date(2024, 2, 1).at(9, 30, 0, 0)));

    let upserts = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, SyncEvent::TaskUpserted(_)))
        .count();
    assert_eq!(upserts, 2);
}

#[tokio::test]
async fn pull_skips_tasks_whose_etag_is_unchanged() {
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.remote.insert(HOME, remote_todo("r1", "Call plumber"));
    t.engine.sync().await.unwrap();
    let before = t.task(HOME, "r1").await.unwrap();
    let mut events = t.engine.subscribe();

    let report = t.engine.sync().await.unwrap();

    assert_eq!(report.pulled_unchanged, 1);
    assert_eq!(report.pulled_updated, 0);
    assert_eq!(t.task(HOME, "r1").await.unwrap(), before);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn pull_overwrites_local_copy_when_etag_changes() {
    // Arrange
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.remote.insert(HOME, remote_todo("r1", "Call plumber"));
    t.engine.sync().await.unwrap();
    let id = t.task(HOME, "r1").await.unwrap().id;

    // Act: another client completes the task
    let edited = VTodo {
        status: TodoStatus::Completed,
        completed: Some(date(2024, 2, 2).at(10, 0, 0, 0)),
        ..remote_todo("r1", "Call plumber again")
    };
    let etag = t.remote.insert(HOME, edited);
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pulled_updated, 1);
    let task = t.task(HOME, "r1").await.unwrap();
    assert_eq!(task.id, id);
    assert_eq!(task.data.title, "Call plumber again");
    assert_eq!(task.data.status, TaskStatus::Completed);
    assert_eq!(task.etag.as_deref(), Some(etag.as_str()));
    assert!(!task.dirty);
}

#[tokio::test]
async fn pull_compares_etags_not_timestamps() {
    // a server that rewrites content without a new tag is trusted as unchanged
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.remote
        .insert_with_etag(HOME, remote_todo("r1", "Original"), "\"fixed\"");
    t.engine.sync().await.unwrap();

    let rewritten = VTodo {
        last_modified: Some(date(2030, 1, 1).at(0, 0, 0, 0)),
        ..remote_todo("r1", "Rewritten")
    };
    t.remote.insert_with_etag(HOME, rewritten, "\"fixed\"");
    let report = t.engine.sync().await.unwrap();

    assert_eq!(report.pulled_unchanged, 1);
    assert_eq!(t.task(HOME, "r1").await.unwrap().data.title, "Original");
}

#[tokio::test]
async fn pull_updates_local_copy_without_etag() {
    // Arrange: a task that shares a uid with the server but has no tag yet
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.engine.sync().await.unwrap();
    let home = t.collection(HOME).await;
    let local = t
        .store
        .insert_task(NewTask {
            uid: Some("r1".into()),
            dirty: false,
            ..NewTask::local(home.id, TaskData::new("Stale"))
        })
        .await
        .unwrap();
    let etag = t.remote.insert(HOME, remote_todo("r1", "Fresh"));

    // Act
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pulled_updated, 1);
    let task = t.store.get_task(local.id).await.unwrap().unwrap();
    assert_eq!(task.data.title, "Fresh");
    assert_eq!(task.etag.as_deref(), Some(etag.as_str()));
}

#[tokio::test]
async fn pull_remote_change_wins_over_unpushed_edit() {
    // Arrange
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.remote.insert(HOME, remote_todo("r1", "Call plumber"));
    t.engine.sync().await.unwrap();
    let task = t.task(HOME, "r1").await.unwrap();
    update_task(t.store.as_ref(), task.id, TaskData::new("Local edit"))
        .await
        .unwrap();

    // Act: the push fails and the server moved on meanwhile
    t.remote.fail_put("r1");
    t.remote.insert(HOME, remote_todo("r1", "Remote edit"));
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.errors[0].kind, ItemErrorKind::Push);
    assert_eq!(report.pulled_updated, 1);
    let task = t.task(HOME, "r1").await.unwrap();
    assert_eq!(task.data.title, "Remote edit");
    assert!(!task.dirty);
}

#[tokio::test]
async fn pull_removes_tasks_deleted_on_server() {
    // Arrange
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.remote.insert(HOME, remote_todo("r1", "Stays"));
    t.remote.insert(HOME, remote_todo("r2", "Goes"));
    t.engine.sync().await.unwrap();
    let gone = t.task(HOME, "r2").await.unwrap();
    let mut events = t.engine.subscribe();

    // Act
    t.remote.remove(HOME, "r2");
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pulled_removed, 1);
    assert_eq!(report.tasks_purged, 1);
    assert!(t.task(HOME, "r1").await.is_some());
    assert!(t.store.get_task(gone.id).await.unwrap().is_none());
    assert!(drain(&mut events).contains(&SyncEvent::TaskDeleted {
        id: gone.id,
        collection_id: gone.collection_id,
        uid: Some("r2".into()),
    }));
}

#[tokio::test]
async fn pull_keeps_dirty_task_deleted_on_server() {
    // Arrange
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.remote.insert(HOME, remote_todo("r1", "Call plumber"));
    t.engine.sync().await.unwrap();
    let task = t.task(HOME, "r1").await.unwrap();
    update_task(t.store.as_ref(), task.id, TaskData::new("Still needed"))
        .await
        .unwrap();
    t.remote.fail_put("r1");
    t.remote.remove(HOME, "r1");

    // Act
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pulled_removed, 0);
    let kept = t.store.get_task(task.id).await.unwrap().unwrap();
    assert!(kept.dirty && !kept.deleted);

    // Act: the next successful push brings it back
    t.remote.clear_failures();
    t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(t.remote.task(HOME, "r1").unwrap().todo.summary, "Still needed");
}

#[tokio::test]
async fn pull_keeps_task_whose_resource_is_unreadable() {
    // Arrange
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.remote.insert(HOME, remote_todo("r1", "Call plumber"));
    t.engine.sync().await.unwrap();

    // Act: the resource is still there but no longer parses
    t.remote.remove(HOME, "r1");
    t.remote.add_unreadable(HOME, "r1");
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pulled_removed, 0);
    assert_eq!(report.skipped_resources, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ItemErrorKind::Parse);
    assert_eq!(report.errors[0].target, "/cal/home/r1.ics");
    assert!(t.task(HOME, "r1").await.is_some());
}

#[tokio::test]
async fn pull_keeps_task_when_unreadable_resource_has_another_name() {
    // Arrange
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.remote.insert(HOME, remote_todo("r1", "Call plumber"));
    t.remote.insert(HOME, remote_todo("r2", "Water plants"));
    t.engine.sync().await.unwrap();

    // Act: another client rewrote r1 under its own file name, and it no longer parses
    t.remote.remove(HOME, "r1");
    t.remote.remove(HOME, "r2");
    t.remote.add_unreadable(HOME, "r1-file");
    let report = t.engine.sync().await.unwrap();

    // Assert: nothing is removed while any resource of the collection is unreadable
    assert_eq!(report.pulled_removed, 0);
    assert_eq!(report.tasks_purged, 0);
    assert_eq!(report.skipped_resources, 1);
    assert!(t.task(HOME, "r1").await.is_some_and(|task| !task.deleted));
    assert!(t.task(HOME, "r2").await.is_some_and(|task| !task.deleted));

    // Act: once the collection reads cleanly, deletions are picked up again
    t.remote.clear_unreadable(HOME);
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pulled_removed, 2);
    assert!(t.task(HOME, "r1").await.is_none());
    assert!(t.task(HOME, "r2").await.is_none());
}

#[tokio::test]
async fn pull_counts_unreadable_resources() {
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.remote.insert(HOME, remote_todo("r1", "Readable"));
    t.remote.add_unreadable(HOME, "broken-1");
    t.remote.add_unreadable(HOME, "broken-2");

    let report = t.engine.sync().await.unwrap();

    assert_eq!(report.pulled_created, 1);
    assert_eq!(report.skipped_resources, 2);
    assert_eq!(
        report.error_summary().as_deref(),
        Some("2 items failed, first: parse /cal/home/broken-1.ics: missing UID property")
    );
}

#[tokio::test]
async fn pull_continues_past_failed_collection() {
    // Arrange
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME, WORK]));
    t.remote.insert(WORK, remote_todo("w1", "Report"));
    t.remote.fail_fetch(HOME, Failure::Status);

    // Act
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pulled_created, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ItemErrorKind::Fetch);
    assert_eq!(report.errors[0].target, HOME);
    assert!(t.task(WORK, "w1").await.is_some());
}

#[tokio::test]
async fn pull_keeps_tasks_separate_per_collection() {
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME, WORK]));
    t.remote.insert(HOME, remote_todo("shared", "Home copy"));
    t.remote.insert(WORK, remote_todo("shared", "Work copy"));

    let report = t.engine.sync().await.unwrap();

    assert_eq!(report.pulled_created, 2);
    assert_eq!(t.task(HOME, "shared").await.unwrap().data.title, "Home copy");
    assert_eq!(t.task(WORK, "shared").await.unwrap().data.title, "Work copy");
}
