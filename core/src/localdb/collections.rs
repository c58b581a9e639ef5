// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use sqlx::SqlitePool;
use tasksync_caldav::Href;

use crate::collection::{Collection, CollectionId};

#[derive(Debug, Clone)]
pub struct Collections {
    pool: SqlitePool,
}

impl Collections {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<CollectionRecord>, sqlx::Error> {
        const SQL: &str = "SELECT id, path, name FROM collections ORDER BY id;";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    pub async fn exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        const SQL: &str = "SELECT EXISTS (SELECT 1 FROM collections WHERE id = ?);";

        sqlx::query_scalar(SQL)
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    /// Inserts the collection unless its path is already known, then reads it back.
    pub async fn get_or_insert(
        &self,
        path: &str,
        name: &str,
    ) -> Result<CollectionRecord, sqlx::Error> {
        const INSERT: &str = "\
INSERT INTO collections (path, name) VALUES (?, ?)
ON CONFLICT(path) DO NOTHING;
";
        const SELECT: &str = "SELECT id, path, name FROM collections WHERE path = ?;";

        sqlx::query(INSERT)
            .bind(path)
            .bind(name)
            .execute(&self.pool)
            .await?;

        sqlx::query_as(SELECT)
            .bind(path)
            .fetch_one(&self.pool)
            .await
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRecord {
    id: i64,
    path: String,
    name: String,
}

impl From<CollectionRecord> for Collection {
    fn from(record: CollectionRecord) -> Self {
        Self {
            id: CollectionId(record.id),
            path: Href::from(record.path),
            name: record.name,
        }
    }
}
