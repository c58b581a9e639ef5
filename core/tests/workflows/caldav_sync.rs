// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Sync passes against a mocked `CalDAV` server over HTTP.

use std::sync::Arc;

use jiff::civil::date;
use tasksync_caldav::CalDavClient;
use tasksync_core::{
    LocalStore, NewTask, SqliteStore, SyncConfig, SyncEngine, SyncError, TaskStatus, delete_task,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{at, buy_milk};

const ROOT: &str = "/calendars/alice/";
const TASKS: &str = "/calendars/alice/tasks/";

const TODO_MILK: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VTODO\r\nUID:milk\r\n\
SUMMARY:Buy milk\r\nDUE:20240115T170000\r\nSTATUS:IN-PROCESS\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";

struct Setup {
    engine: SyncEngine,
    store: Arc<SqliteStore>,
}

async fn setup(server_url: String) -> Setup {
    let mut config = SyncConfig::new(server_url);
    config.username = "alice".into();
    config.password = "secret".into();
    assert_eq!(config.collection_root(), ROOT);

    let store = Arc::new(SqliteStore::open(None).await.unwrap());
    let client = CalDavClient::new(config.caldav_config()).unwrap();
    let engine = SyncEngine::new(
        Arc::clone(&store) as Arc<dyn LocalStore>,
        Arc::new(client),
        config.sync_options(),
    );
    Setup { engine, store }
}

fn multistatus(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(207).set_body_raw(
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
<D:multistatus xmlns:D=\"DAV:\" xmlns:C=\"urn:ietf:params:xml:ns:caldav\">{body}</D:multistatus>"
        ),
        "application/xml",
    )
}

fn collection(href: &str) -> String {
    format!(
        "<D:response><D:href>{href}</D:href><D:propstat><D:prop>\
<D:resourcetype><D:collection/><C:calendar/></D:resourcetype>\
</D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response>"
    )
}

fn resource(href: &str, etag: &str, data: &str) -> String {
    format!(
        "<D:response><D:href>{href}</D:href><D:propstat><D:prop>\
<D:getetag>{etag}</D:getetag>\
<C:calendar-data>{data}</C:calendar-data>\
</D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response>"
    )
}

async fn mount_listing(server: &MockServer, tasks: &str) {
    Mock::given(method("PROPFIND"))
        .and(path(ROOT))
        .and(header("Depth", "1"))
        .respond_with(multistatus(&[collection(ROOT), collection(TASKS)].concat()))
        .mount(server)
        .await;
    Mock::given(method("REPORT"))
        .and(path(TASKS))
        .and(body_string_contains("VTODO"))
        .respond_with(multistatus(tasks))
        .mount(server)
        .await;
}

#[tokio::test]
async fn caldav_sync_pulls_server_tasks() {
    // Arrange
    let server = MockServer::start().await;
    mount_listing(
        &server,
        &resource("/calendars/alice/tasks/milk.ics", "\"e1\"", TODO_MILK),
    )
    .await;
    let s = setup(server.uri()).await;

    // Act
    let report = s.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.collections_created, 1);
    assert_eq!(report.pulled_created, 1);
    assert!(report.is_clean());

    let collections = s.store.list_collections().await.unwrap();
    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0].path.as_str(), TASKS);
    assert_eq!(collections[0].name, "tasks");

    let tasks = s.store.list_tasks(collections[0].id).await.unwrap();
    let milk = &tasks[0];
    assert_eq!(milk.uid.as_deref(), Some("milk"));
    assert_eq!(milk.etag.as_deref(), Some("\"e1\""));
    assert_eq!(milk.data.title, "Buy milk");
    assert_eq!(milk.data.status, TaskStatus::InProgress);
    assert_eq!(milk.data.due, Some(date(2024, 1, 15).at(17, 0, 0, 0)));
    assert!(!milk.dirty);
}

#[tokio::test]
async fn caldav_sync_pushes_local_task() {
    // Arrange: the listing already reflects the write the pass is about to make
    let server = MockServer::start().await;
    mount_listing(
        &server,
        &resource("/calendars/alice/tasks/milk.ics", "\"srv-1\"", TODO_MILK),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/calendars/alice/tasks/milk.ics"))
        .and(body_string_contains("SUMMARY:Buy milk"))
        .and(body_string_contains("DUE:20240115T170000"))
        .and(body_string_contains("STATUS:NEEDS-ACTION"))
        .respond_with(ResponseTemplate::new(201).insert_header("ETag", "\"srv-1\""))
        .expect(1)
        .mount(&server)
        .await;

    let s = setup(server.uri()).await;
    let collection = s
        .store
        .create_collection(&TASKS.into(), "tasks")
        .await
        .unwrap();
    let local = s
        .store
        .insert_task(NewTask {
            uid: Some("milk".into()),
            ..NewTask::local(collection.id, buy_milk())
        })
        .await
        .unwrap();

    // Act
    let report = s.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pushed_created, 1);
    assert_eq!(report.pulled_unchanged, 1);
    let stored = s.store.get_task(local.id).await.unwrap().unwrap();
    assert_eq!(stored.etag.as_deref(), Some("\"srv-1\""));
    assert_eq!(stored.data, buy_milk());
    assert!(!stored.dirty);
}

#[tokio::test]
async fn caldav_sync_pushes_deletion() {
    // Arrange
    let server = MockServer::start().await;
    mount_listing(
        &server,
        &resource("/calendars/alice/tasks/milk.ics", "\"e1\"", TODO_MILK),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/calendars/alice/tasks/milk.ics"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let s = setup(server.uri()).await;
    s.engine.sync_at(at("2024-03-01T09:00:00Z")).await.unwrap();
    let collection = s.store.list_collections().await.unwrap().remove(0);
    let milk = s.store.list_tasks(collection.id).await.unwrap().remove(0);

    // Act: the mocked listing keeps the resource, like a lagging server
    delete_task(s.store.as_ref(), milk.id, at("2024-03-01T10:00:00Z"))
        .await
        .unwrap();
    let report = s.engine.sync_at(at("2024-03-01T10:00:05Z")).await.unwrap();
    let later = s.engine.sync_at(at("2024-03-01T11:00:00Z")).await.unwrap();

    // Assert
    assert_eq!(report.pushed_deleted, 1);
    assert_eq!(report.tasks_purged, 1);
    assert_eq!(later.pulled_suppressed, 1);
    assert!(s.store.list_tasks(collection.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn caldav_sync_reports_unreachable_server() {
    // Arrange: a server that is gone
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);
    let s = setup(uri).await;

    // Act
    let err = s.engine.sync_at(at("2024-03-01T09:00:00Z")).await.unwrap_err();

    // Assert
    assert!(matches!(err, SyncError::Unreachable(_)), "got {err:?}");
    let state = s.store.sync_state().await.unwrap();
    assert_eq!(state.last_attempt, Some(at("2024-03-01T09:00:00Z")));
    assert_eq!(state.last_success, None);
    assert!(state.last_error.is_some());
}
