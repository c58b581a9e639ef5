// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Bidirectional synchronization of a local task store with `CalDAV` task
//! collections.
//!
//! [`SyncEngine`] runs reconciliation passes between a [`LocalStore`] and a
//! [`RemoteRepository`]; [`Scheduler`] decides when they run.

mod collection;
mod config;
mod engine;
mod error;
mod events;
mod localdb;
mod memory;
mod remote;
mod scheduler;
mod state;
mod store;
mod task;

pub use crate::collection::{Collection, CollectionId, Tombstone};
pub use crate::config::{APP_NAME, ServerFlavor, SyncConfig, expand_path, get_config_dir};
pub use crate::engine::{SyncEngine, SyncOptions};
pub use crate::error::{ConfigError, StoreError, SyncError};
pub use crate::events::SyncEvent;
pub use crate::localdb::SqliteStore;
pub use crate::memory::MemoryStore;
pub use crate::remote::RemoteRepository;
pub use crate::scheduler::{
    Debounce, Scheduler, SchedulerHandle, SchedulerOptions, SchedulerState, SchedulerStatus,
};
pub use crate::state::{ItemError, ItemErrorKind, SyncReport, SyncState};
pub use crate::store::{LocalStore, create_task, delete_task, update_task};
pub use crate::task::{
    LocalTask, MAX_PRIORITY, NewTask, TaskData, TaskId, TaskStatus, priority_from_wire,
    priority_to_wire,
};
