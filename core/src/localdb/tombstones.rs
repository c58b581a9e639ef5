// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct Tombstones {
    pool: SqlitePool,
}

impl Tombstones {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(
        &self,
        collection_id: i64,
        uid: &str,
        deleted_at: i64,
    ) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
INSERT INTO tombstones (collection_id, uid, deleted_at) VALUES (?, ?, ?)
ON CONFLICT(collection_id, uid) DO UPDATE SET deleted_at = excluded.deleted_at;
";

        sqlx::query(SQL)
            .bind(collection_id)
            .bind(uid)
            .bind(deleted_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Gets the deletion time, in milliseconds, of a tombstone.
    pub async fn get(&self, collection_id: i64, uid: &str) -> Result<Option<i64>, sqlx::Error> {
        const SQL: &str = "SELECT deleted_at FROM tombstones WHERE collection_id = ? AND uid = ?;";

        sqlx::query_scalar(SQL)
            .bind(collection_id)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete_until(&self, cutoff: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tombstones WHERE deleted_at <= ?;")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
