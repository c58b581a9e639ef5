// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use jiff::civil::DateTime;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, query::Query};

use crate::collection::CollectionId;
use crate::error::StoreError;
use crate::task::{LocalTask, NewTask, TaskData, TaskId, TaskStatus};

const COLUMNS: &str = "\
id, collection_id, uid, title, description, location, url, organizer, priority, status, \
start_at, due_at, completed_at, created_at, percent, categories, etag, remote_modified, dirty, deleted";

#[derive(Debug, Clone)]
pub struct Tasks {
    pool: SqlitePool,
}

impl Tasks {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<TaskRecord>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM tasks WHERE id = ?;");
        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_by_collection(
        &self,
        collection_id: i64,
    ) -> Result<Vec<TaskRecord>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM tasks WHERE collection_id = ? ORDER BY id;");
        sqlx::query_as(&sql)
            .bind(collection_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn list_dirty(&self) -> Result<Vec<TaskRecord>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM tasks WHERE dirty = 1 ORDER BY id;");
        sqlx::query_as(&sql).fetch_all(&self.pool).await
    }

    /// Inserts a record and returns its new id. The id of `record` is ignored.
    pub async fn insert(&self, record: &TaskRecord) -> Result<i64, sqlx::Error> {
        const SQL: &str = "\
INSERT INTO tasks (
    collection_id, uid, title, description, location, url, organizer, priority, status,
    start_at, due_at, completed_at, created_at, percent, categories, etag, remote_modified,
    dirty, deleted
)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);
";

        let result = bind_fields(sqlx::query(SQL), record)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrites a record, returning whether it existed.
    pub async fn update(&self, record: &TaskRecord) -> Result<bool, sqlx::Error> {
        const SQL: &str = "\
UPDATE tasks SET
    collection_id   = ?,
    uid             = ?,
    title           = ?,
    description     = ?,
    location        = ?,
    url             = ?,
    organizer       = ?,
    priority        = ?,
    status          = ?,
    start_at        = ?,
    due_at          = ?,
    completed_at    = ?,
    created_at      = ?,
    percent         = ?,
    categories      = ?,
    etag            = ?,
    remote_modified = ?,
    dirty           = ?,
    deleted         = ?
WHERE id = ?;
";

        let result = bind_fields(sqlx::query(SQL), record)
            .bind(record.id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_pushed_deletions(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE deleted = 1 AND dirty = 0;")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn bind_fields<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    record: &'q TaskRecord,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    query
        .bind(record.collection_id)
        .bind(&record.uid)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.location)
        .bind(&record.url)
        .bind(&record.organizer)
        .bind(record.priority)
        .bind(&record.status)
        .bind(&record.start_at)
        .bind(&record.due_at)
        .bind(&record.completed_at)
        .bind(&record.created_at)
        .bind(record.percent)
        .bind(&record.categories)
        .bind(&record.etag)
        .bind(record.remote_modified)
        .bind(record.dirty)
        .bind(record.deleted)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRecord {
    id: i64,
    collection_id: i64,
    uid: Option<String>,
    title: String,
    description: Option<String>,
    location: Option<String>,
    url: Option<String>,
    organizer: Option<String>,
    priority: i64,
    status: String,
    start_at: Option<String>,
    due_at: Option<String>,
    completed_at: Option<String>,
    created_at: Option<String>,
    percent: i64,
    categories: String,
    etag: Option<String>,
    remote_modified: Option<i64>,
    dirty: bool,
    deleted: bool,
}

impl TaskRecord {
    pub fn from_task(task: &LocalTask) -> Result<Self, StoreError> {
        let data = &task.data;
        let categories =
            serde_json::to_string(&data.categories).map_err(|e| StoreError::Corrupt {
                field: "categories",
                value: e.to_string(),
            })?;

        Ok(Self {
            id: task.id.0,
            collection_id: task.collection_id.0,
            uid: task.uid.clone(),
            title: data.title.clone(),
            description: data.description.clone(),
            location: data.location.clone(),
            url: data.url.clone(),
            organizer: data.organizer.clone(),
            priority: data.priority.into(),
            status: data.status.as_str().to_string(),
            start_at: data.start.map(|dt| dt.to_string()),
            due_at: data.due.map(|dt| dt.to_string()),
            completed_at: data.completed.map(|dt| dt.to_string()),
            created_at: data.created.map(|dt| dt.to_string()),
            percent: data.percent_complete.into(),
            categories,
            etag: task.etag.clone(),
            remote_modified: task.remote_modified.map(Timestamp::as_millisecond),
            dirty: task.dirty,
            deleted: task.deleted,
        })
    }

    pub fn from_new(task: NewTask) -> Result<Self, StoreError> {
        Self::from_task(&task.into_task(TaskId(0)))
    }
}

impl TryFrom<TaskRecord> for LocalTask {
    type Error = StoreError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_name(&record.status).ok_or(StoreError::Corrupt {
            field: "status",
            value: record.status.clone(),
        })?;
        let categories: Vec<String> =
            serde_json::from_str(&record.categories).map_err(|_| StoreError::Corrupt {
                field: "categories",
                value: record.categories.clone(),
            })?;
        let remote_modified = record
            .remote_modified
            .map(|ms| {
                Timestamp::from_millisecond(ms).map_err(|_| StoreError::Corrupt {
                    field: "remote_modified",
                    value: ms.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            id: TaskId(record.id),
            collection_id: CollectionId(record.collection_id),
            uid: record.uid,
            data: TaskData {
                title: record.title,
                description: record.description,
                location: record.location,
                url: record.url,
                organizer: record.organizer,
                priority: small_int("priority", record.priority)?,
                status,
                start: parse_datetime("start_at", record.start_at)?,
                due: parse_datetime("due_at", record.due_at)?,
                completed: parse_datetime("completed_at", record.completed_at)?,
                created: parse_datetime("created_at", record.created_at)?,
                percent_complete: small_int("percent", record.percent)?,
                categories,
            },
            etag: record.etag,
            remote_modified,
            dirty: record.dirty,
            deleted: record.deleted,
        })
    }
}

fn small_int(field: &'static str, value: i64) -> Result<u8, StoreError> {
    u8::try_from(value).map_err(|_| StoreError::Corrupt {
        field,
        value: value.to_string(),
    })
}

fn parse_datetime(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<DateTime>, StoreError> {
    value
        .map(|s| {
            s.parse::<DateTime>()
                .map_err(|_| StoreError::Corrupt { field, value: s })
        })
        .transpose()
}
