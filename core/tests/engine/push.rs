// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Push phase: local changes reach the server.

use jiff::Timestamp;
use tasksync_core::{
    ItemErrorKind, LocalStore, SyncEvent, TaskData, TaskStatus, create_task, delete_task,
    update_task,
};
use tasksync_ical::TodoStatus;

use crate::common::{Call, FakeRemote, TestEngine, buy_milk, drain};

const HOME: &str = "/cal/home/";

async fn engine_with_home() -> TestEngine {
    let t = TestEngine::new(FakeRemote::with_collections(&[HOME]));
    t.engine.sync().await.unwrap();
    t
}

#[tokio::test]
async fn push_creates_task_and_stores_uid_and_etag() {
    // Arrange
    let t = engine_with_home().await;
    let home = t.collection(HOME).await;
    let task = create_task(t.store.as_ref(), home.id, buy_milk())
        .await
        .unwrap();
    let mut events = t.engine.subscribe();

    // Act
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pushed_created, 1);
    let stored = t.store.get_task(task.id).await.unwrap().unwrap();
    let uid = stored.uid.clone().expect("uid assigned on push");
    assert!(!stored.dirty);

    let remote = t.remote.task(HOME, &uid).expect("resource created");
    assert_eq!(stored.etag.as_deref(), remote.etag.as_deref());
    assert_eq!(remote.todo.summary, "Buy milk");
    assert_eq!(remote.todo.status, TodoStatus::NeedsAction);
    assert_eq!(remote.todo.due, buy_milk().due);

    assert!(drain(&mut events).contains(&SyncEvent::TaskUpserted(stored)));
}

#[tokio::test]
async fn push_scenario_pull_leaves_pushed_task_untouched() {
    let t = engine_with_home().await;
    let home = t.collection(HOME).await;
    let task = create_task(t.store.as_ref(), home.id, buy_milk())
        .await
        .unwrap();

    let report = t.engine.sync().await.unwrap();

    // the pull in the same pass sees the resource just written
    assert_eq!(report.pushed_created, 1);
    assert_eq!(report.pulled_unchanged, 1);
    assert_eq!(report.pulled_updated, 0);
    assert_eq!(report.pulled_created, 0);
    let after_first = t.store.get_task(task.id).await.unwrap().unwrap();

    let report = t.engine.sync().await.unwrap();

    assert_eq!(report.pulled_unchanged, 1);
    assert_eq!(t.store.get_task(task.id).await.unwrap().unwrap(), after_first);
    assert_eq!(t.tasks(HOME).await.len(), 1);
}

#[tokio::test]
async fn push_same_dirty_task_twice_keeps_one_resource() {
    // Arrange
    let t = engine_with_home().await;
    let home = t.collection(HOME).await;
    let task = create_task(t.store.as_ref(), home.id, buy_milk())
        .await
        .unwrap();
    t.engine.sync().await.unwrap();
    let uid = t.store.get_task(task.id).await.unwrap().unwrap().uid.unwrap();

    // Act: mark dirty without changing content, push again
    update_task(t.store.as_ref(), task.id, buy_milk())
        .await
        .unwrap();
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pushed_updated, 1);
    assert_eq!(t.remote.uids(HOME), vec![uid.clone()]);
    let stored = t.store.get_task(task.id).await.unwrap().unwrap();
    assert_eq!(stored.uid.as_deref(), Some(uid.as_str()));
    assert_eq!(
        stored.etag.as_deref(),
        t.remote.task(HOME, &uid).unwrap().etag.as_deref()
    );
    let puts = t.remote.count_calls(|c| matches!(c, Call::Put(_, u) if *u == uid));
    assert_eq!(puts, 2);
}

#[tokio::test]
async fn push_update_writes_new_content() {
    let t = engine_with_home().await;
    let home = t.collection(HOME).await;
    let task = create_task(t.store.as_ref(), home.id, buy_milk())
        .await
        .unwrap();
    t.engine.sync().await.unwrap();

    let done = TaskData {
        status: TaskStatus::Completed,
        percent_complete: 100,
        ..buy_milk()
    };
    update_task(t.store.as_ref(), task.id, done).await.unwrap();
    t.engine.sync().await.unwrap();

    let uid = t.store.get_task(task.id).await.unwrap().unwrap().uid.unwrap();
    let remote = t.remote.task(HOME, &uid).unwrap();
    assert_eq!(remote.todo.status, TodoStatus::Completed);
    assert_eq!(remote.todo.percent_complete, 100);
}

#[tokio::test]
async fn push_failure_keeps_task_dirty_for_retry() {
    // Arrange
    let t = engine_with_home().await;
    let home = t.collection(HOME).await;
    let ok = create_task(t.store.as_ref(), home.id, TaskData::new("Fine"))
        .await
        .unwrap();
    let failing = create_task(t.store.as_ref(), home.id, TaskData::new("Flaky"))
        .await
        .unwrap();

    // Act: the first push assigns the uid, the second one fails
    t.engine.sync().await.unwrap();
    let mut flaky = t.store.get_task(failing.id).await.unwrap().unwrap();
    let uid = flaky.uid.clone().unwrap();
    t.remote.fail_put(&uid);
    flaky.data.title = "Flaky, edited".into();
    update_task(t.store.as_ref(), failing.id, flaky.data.clone())
        .await
        .unwrap();
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ItemErrorKind::Push);
    assert_eq!(report.errors[0].target, uid);
    let stored = t.store.get_task(failing.id).await.unwrap().unwrap();
    assert!(stored.dirty);
    assert!(!t.store.get_task(ok.id).await.unwrap().unwrap().dirty);

    // Act: the server recovers
    t.remote.clear_failures();
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert!(report.is_clean());
    assert_eq!(report.pushed_updated, 1);
    assert!(!t.store.get_task(failing.id).await.unwrap().unwrap().dirty);
    assert_eq!(t.remote.task(HOME, &uid).unwrap().todo.summary, "Flaky, edited");
}

#[tokio::test]
async fn push_failure_on_create_reuses_uid_on_retry() {
    // Arrange
    let t = engine_with_home().await;
    let home = t.collection(HOME).await;
    let task = create_task(t.store.as_ref(), home.id, buy_milk())
        .await
        .unwrap();
    t.remote.fail_every_put();

    // Act
    let report = t.engine.sync().await.unwrap();

    // Assert: the uid is stored before the request
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ItemErrorKind::Push);
    let stored = t.store.get_task(task.id).await.unwrap().unwrap();
    let uid = stored.uid.clone().expect("uid kept after failed create");
    assert!(stored.dirty);
    assert_eq!(stored.etag, None);

    // Act
    t.remote.clear_failures();
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pushed_created, 1);
    assert_eq!(t.remote.uids(HOME), vec![uid.clone()]);
    let puts = t.remote.count_calls(|c| matches!(c, Call::Put(_, u) if *u == uid));
    assert_eq!(puts, 2);
}

#[tokio::test]
async fn push_deletion_removes_resource_and_purges() {
    // Arrange
    let t = engine_with_home().await;
    let home = t.collection(HOME).await;
    let task = create_task(t.store.as_ref(), home.id, buy_milk())
        .await
        .unwrap();
    t.engine.sync().await.unwrap();
    let uid = t.store.get_task(task.id).await.unwrap().unwrap().uid.unwrap();

    // Act
    delete_task(t.store.as_ref(), task.id, Timestamp::now())
        .await
        .unwrap();
    let report = t.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pushed_deleted, 1);
    assert_eq!(report.tasks_purged, 1);
    assert!(t.remote.uids(HOME).is_empty());
    assert!(t.store.get_task(task.id).await.unwrap().is_none());
    assert_eq!(
        t.remote
            .count_calls(|c| matches!(c, Call::Delete(h, u) if h.as_str() == HOME && *u == uid)),
        1
    );
}

#[tokio::test]
async fn push_deletion_of_unpushed_task_sends_nothing() {
    let t = engine_with_home().await;
    let home = t.collection(HOME).await;
    let task = create_task(t.store.as_ref(), home.id, buy_milk())
        .await
        .unwrap();
    delete_task(t.store.as_ref(), task.id, Timestamp::now())
        .await
        .unwrap();
    t.remote.clear_calls();

    let report = t.engine.sync().await.unwrap();

    assert_eq!(report.pushed_deleted, 0);
    assert_eq!(report.pushed_created, 0);
    assert_eq!(report.tasks_purged, 1);
    let writes = t
        .remote
        .count_calls(|c| matches!(c, Call::Put(..) | Call::Delete(..)));
    assert_eq!(writes, 0);
}

#[tokio::test]
async fn push_deletion_failure_keeps_task_pending() {
    let t = engine_with_home().await;
    let home = t.collection(HOME).await;
    let task = create_task(t.store.as_ref(), home.id, buy_milk())
        .await
        .unwrap();
    t.engine.sync().await.unwrap();
    let uid = t.store.get_task(task.id).await.unwrap().unwrap().uid.unwrap();
    delete_task(t.store.as_ref(), task.id, Timestamp::now())
        .await
        .unwrap();
    t.remote.fail_delete(&uid);

    let report = t.engine.sync().await.unwrap();

    assert_eq!(report.errors[0].kind, ItemErrorKind::Push);
    // still on the server, but the local deletion wins on pull
    assert_eq!(report.pulled_suppressed, 1);
    let stored = t.store.get_task(task.id).await.unwrap().unwrap();
    assert!(stored.deleted && stored.dirty);

    t.remote.clear_failures();
    let report = t.engine.sync().await.unwrap();

    assert_eq!(report.pushed_deleted, 1);
    assert!(t.store.get_task(task.id).await.unwrap().is_none());
}
