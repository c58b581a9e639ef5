// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct SyncStates {
    pool: SqlitePool,
}

impl SyncStates {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> Result<Option<SyncStateRecord>, sqlx::Error> {
        const SQL: &str = "SELECT last_attempt, last_success, last_error FROM sync_state WHERE id = 1;";

        sqlx::query_as(SQL).fetch_optional(&self.pool).await
    }

    pub async fn upsert(&self, record: &SyncStateRecord) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
INSERT INTO sync_state (id, last_attempt, last_success, last_error) VALUES (1, ?, ?, ?)
ON CONFLICT(id) DO UPDATE SET
    last_attempt = excluded.last_attempt,
    last_success = excluded.last_success,
    last_error   = excluded.last_error;
";

        sqlx::query(SQL)
            .bind(record.last_attempt)
            .bind(record.last_success)
            .bind(&record.last_error)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct SyncStateRecord {
    pub last_attempt: Option<i64>,
    pub last_success: Option<i64>,
    pub last_error: Option<String>,
}
