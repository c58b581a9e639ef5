// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::collection::CollectionId;
use crate::task::TaskId;

/// Local store errors.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("Failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// No task with the given id.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// No collection with the given id.
    #[error("Collection not found: {0}")]
    CollectionNotFound(CollectionId),

    /// Another task of the collection already has this uid.
    #[error("Duplicate task uid {uid:?} in collection {collection}")]
    DuplicateUid {
        /// The collection holding both tasks.
        collection: CollectionId,
        /// The shared uid.
        uid: String,
    },

    /// A stored value could not be read back.
    #[error("Invalid stored value for {field}: {value:?}")]
    Corrupt {
        /// Column or field name.
        field: &'static str,
        /// The offending value.
        value: String,
    },

    /// I/O error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end a sync pass.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Another pass is in flight.
    #[error("A sync pass is already running")]
    InProgress,

    /// No collection could be fetched because the server is unreachable.
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    /// The local store failed outside of a single item.
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration errors.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A field holds an unusable value.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A path could not be resolved.
    #[error("Failed to resolve path: {0}")]
    Path(String),
}
