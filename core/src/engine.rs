// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The reconciliation pass.
//!
//! A pass runs in a fixed order: prune expired tombstones, align the local
//! task lists with the discovered collections, push dirty tasks, pull every
//! collection, and purge deletions that reached the server. Every item is
//! committed on its own; a failing item is recorded in the [`SyncReport`] and
//! the pass moves on.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use tasksync_caldav::discovery::collection_name;
use tasksync_caldav::{CalDavError, DiscoverySource, RemoteTask};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::collection::Collection;
use crate::error::{StoreError, SyncError};
use crate::events::{EventBus, SyncEvent};
use crate::remote::RemoteRepository;
use crate::state::{ItemErrorKind, SyncReport, SyncState};
use crate::store::LocalStore;
use crate::task::{LocalTask, NewTask, TaskData};

/// Tuning of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// How long a local deletion keeps suppressing the remote copy.
    pub tombstone_retention: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            tombstone_retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Reconciles a [`LocalStore`] with a [`RemoteRepository`].
///
/// At most one pass runs at a time; a pass requested while another is in
/// flight fails with [`SyncError::InProgress`].
#[derive(Debug)]
pub struct SyncEngine {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteRepository>,
    options: SyncOptions,
    events: EventBus,
    running: AtomicBool,
}

impl SyncEngine {
    /// Creates an engine over the given store and server.
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteRepository>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            remote,
            options,
            events: EventBus::new(),
            running: AtomicBool::new(false),
        }
    }

    /// The local store the engine writes to.
    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    /// Subscribes to the changes applied by later passes.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Whether a pass is in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Reads the persisted outcome of earlier passes.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn sync_state(&self) -> Result<SyncState, StoreError> {
        self.store.sync_state().await
    }

    /// Runs one pass now.
    ///
    /// # Errors
    ///
    /// Fails if another pass is running, if the server could not be reached
    /// for any collection, or if the store fails outside of a single item.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        self.sync_at(Timestamp::now()).await
    }

    /// Runs one pass as if started at `now`.
    ///
    /// # Errors
    ///
    /// See [`SyncEngine::sync`].
    pub async fn sync_at(&self, now: Timestamp) -> Result<SyncReport, SyncError> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            tracing::debug!("sync pass already running");
            return Err(SyncError::InProgress);
        };

        tracing::info!("sync pass started");
        let outcome = self.run_pass(now).await;
        if let Err(e) = self.record_outcome(now, &outcome).await {
            tracing::error!(error = %e, "failed to record sync state");
            if outcome.is_ok() {
                return Err(e.into());
            }
        }

        match &outcome {
            Ok(report) => tracing::info!(
                collections = report.collections,
                pushed = report.pushed_created + report.pushed_updated + report.pushed_deleted,
                pulled = report.pulled_created + report.pulled_updated + report.pulled_removed,
                errors = report.errors.len(),
                "sync pass finished"
            ),
            Err(e) => tracing::warn!(error = %e, "sync pass failed"),
        }
        outcome
    }

    async fn record_outcome(
        &self,
        started: Timestamp,
        outcome: &Result<SyncReport, SyncError>,
    ) -> Result<(), StoreError> {
        let mut state = self.store.sync_state().await?;
        state.last_attempt = Some(started);
        match outcome {
            Ok(report) => {
                state.last_success = Some(started);
                state.last_error = report.error_summary();
            }
            Err(e) => state.last_error = Some(e.to_string()),
        }
        self.store.save_sync_state(&state).await
    }

    async fn run_pass(&self, now: Timestamp) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        let cutoff = self.tombstone_cutoff(now);

        report.tombstones_pruned = self.store.prune_tombstones(cutoff).await?;
        if report.tombstones_pruned > 0 {
            tracing::debug!(count = report.tombstones_pruned, "pruned expired tombstones");
        }

        let collections = self.sync_collections(&mut report).await?;
        report.collections = collections.len();

        self.push_dirty(&collections, &mut report).await?;

        let mut transport_error = None;
        let mut transport_failures = 0;
        for collection in &collections {
            if let Err(e) = self.pull_collection(collection, cutoff, &mut report).await {
                if e.is_transport() {
                    transport_failures += 1;
                    transport_error = Some(e.to_string());
                }
                report.error(ItemErrorKind::Fetch, &collection.path, e);
            }
        }

        report.tasks_purged = self.store.purge_deleted_tasks().await?;

        if !collections.is_empty()
            && transport_failures == collections.len()
            && let Some(error) = transport_error
        {
            return Err(SyncError::Unreachable(error));
        }
        Ok(report)
    }

    fn tombstone_cutoff(&self, now: Timestamp) -> Timestamp {
        SignedDuration::try_from(self.options.tombstone_retention)
            .ok()
            .and_then(|retention| now.checked_sub(retention).ok())
            .unwrap_or(Timestamp::MIN)
    }

    /// Creates lists for new collections and, when discovery is
    /// authoritative, retires lists whose collection is gone. Returns the
    /// collections the rest of the pass works on.
    async fn sync_collections(
        &self,
        report: &mut SyncReport,
    ) -> Result<Vec<Collection>, SyncError> {
        let discovery = self.remote.discover().await;
        let known = self.store.list_collections().await?;

        if let DiscoverySource::Failed(reason) = &discovery.source {
            let target = discovery
                .collections
                .first()
                .map_or_else(String::new, ToString::to_string);
            report.error(ItemErrorKind::Discovery, target, reason);
            if !known.is_empty() {
                return Ok(known);
            }
        }

        let mut active = Vec::with_capacity(discovery.collections.len());
        for path in &discovery.collections {
            if let Some(existing) = known.iter().find(|c| &c.path == path) {
                active.push(existing.clone());
                continue;
            }

            let collection = self
                .store
                .create_collection(path, &collection_name(path))
                .await?;
            tracing::info!(path = %collection.path, name = %collection.name, "collection discovered");
            report.collections_created += 1;
            self.events
                .emit(SyncEvent::CollectionCreated(collection.clone()));
            active.push(collection);
        }

        if discovery.is_authoritative() {
            for collection in known
                .into_iter()
                .filter(|c| !discovery.collections.contains(&c.path))
            {
                let removed = self.store.retire_collection(collection.id).await?;
                tracing::info!(path = %collection.path, tasks = removed.len(), "collection retired");
                for task in &removed {
                    self.events.emit(SyncEvent::task_deleted(task));
                }
                report.collections_retired += 1;
                self.events.emit(SyncEvent::CollectionRetired(collection));
            }
        }

        Ok(active)
    }

    async fn push_dirty(
        &self,
        collections: &[Collection],
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let by_id: HashMap<_, _> = collections.iter().map(|c| (c.id, c)).collect();
        for task in self.store.list_dirty_tasks().await? {
            let Some(collection) = by_id.get(&task.collection_id) else {
                tracing::debug!(id = %task.id, collection = %task.collection_id, "skipping task of inactive collection");
                continue;
            };

            let id = task.id;
            let target = task.uid.clone().unwrap_or_else(|| id.to_string());
            match self.push_task(collection, task).await {
                Ok(Pushed::Created) => report.pushed_created += 1,
                Ok(Pushed::Updated) => report.pushed_updated += 1,
                Ok(Pushed::Deleted) => report.pushed_deleted += 1,
                Ok(Pushed::Discarded) => {}
                Err(e) => report.error(e.kind(ItemErrorKind::Push), target, e),
            }
        }
        Ok(())
    }

    async fn push_task(
        &self,
        collection: &Collection,
        mut task: LocalTask,
    ) -> Result<Pushed, ItemFailure> {
        if task.deleted {
            let pushed = if let Some(uid) = &task.uid {
                self.remote.delete(&collection.path, uid).await?;
                tracing::debug!(uid = %uid, collection = %collection.path, "pushed deletion");
                Pushed::Deleted
            } else {
                Pushed::Discarded
            };
            task.dirty = false;
            self.store.save_task(&task).await?;
            return Ok(pushed);
        }

        let created = task.etag.is_none();
        let uid = if let Some(uid) = &task.uid {
            uid.clone()
        } else {
            // stored before the request so a retry writes the same resource
            let uid = Uuid::new_v4().to_string();
            task.uid = Some(uid.clone());
            self.store.save_task(&task).await?;
            uid
        };

        let etag = self
            .remote
            .put(&collection.path, &task.data.to_vtodo(&uid))
            .await?;
        tracing::debug!(uid = %uid, etag = %etag, collection = %collection.path, "pushed task");

        // an edit made while the request was in flight stays dirty
        let mut stored = self
            .store
            .get_task(task.id)
            .await?
            .ok_or(StoreError::TaskNotFound(task.id))?;
        stored.uid = Some(uid);
        stored.etag = Some(etag.to_string());
        stored.dirty = stored.deleted || stored.data != task.data;
        self.store.save_task(&stored).await?;
        self.events.emit(SyncEvent::TaskUpserted(stored));

        Ok(if created {
            Pushed::Created
        } else {
            Pushed::Updated
        })
    }

    async fn pull_collection(
        &self,
        collection: &Collection,
        cutoff: Timestamp,
        report: &mut SyncReport,
    ) -> Result<(), CalDavError> {
        let fetch = self.remote.fetch_all(&collection.path).await?;
        tracing::debug!(
            collection = %collection.path,
            tasks = fetch.tasks.len(),
            skipped = fetch.skipped.len(),
            "fetched collection"
        );

        report.skipped_resources += fetch.skipped.len();
        for skipped in &fetch.skipped {
            report.error(ItemErrorKind::Parse, &skipped.href, &skipped.reason);
        }

        let locals = match self.store.list_tasks(collection.id).await {
            Ok(locals) => locals,
            Err(e) => {
                report.error(ItemErrorKind::Store, &collection.path, e);
                return Ok(());
            }
        };
        let by_uid: HashMap<&str, &LocalTask> = locals
            .iter()
            .filter_map(|t| t.uid.as_deref().map(|uid| (uid, t)))
            .collect();

        for remote in &fetch.tasks {
            let result = match by_uid.get(remote.uid()) {
                Some(local) => self.pull_existing(local, remote).await,
                None => self.pull_new(collection, remote, cutoff).await,
            };
            match result {
                Ok(Pulled::Created) => report.pulled_created += 1,
                Ok(Pulled::Updated) => report.pulled_updated += 1,
                Ok(Pulled::Unchanged) => report.pulled_unchanged += 1,
                Ok(Pulled::Suppressed) => report.pulled_suppressed += 1,
                Err(e) => report.error(ItemErrorKind::Store, remote.uid(), e),
            }
        }

        // an unreadable resource may hold any of the missing uids, whatever its name
        if !fetch.skipped.is_empty() {
            tracing::debug!(
                collection = %collection.path,
                skipped = fetch.skipped.len(),
                "unreadable resources, not detecting remote deletions"
            );
            return Ok(());
        }

        let seen: HashSet<&str> = fetch.tasks.iter().map(RemoteTask::uid).collect();
        for local in &locals {
            let Some(uid) = local.uid.as_deref() else {
                continue;
            };
            if local.dirty || local.deleted || !local.is_known_remotely() || seen.contains(uid) {
                continue;
            }

            let mut task = local.clone();
            task.deleted = true;
            match self.store.save_task(&task).await {
                Ok(()) => {
                    tracing::debug!(uid = %uid, collection = %collection.path, "task removed on server");
                    report.pulled_removed += 1;
                    self.events.emit(SyncEvent::task_deleted(&task));
                }
                Err(e) => report.error(ItemErrorKind::Store, uid, e),
            }
        }

        Ok(())
    }

    /// Applies a remote task to the local copy sharing its uid. The remote
    /// side wins whenever the entity tags differ.
    async fn pull_existing(
        &self,
        local: &LocalTask,
        remote: &RemoteTask,
    ) -> Result<Pulled, StoreError> {
        if local.deleted {
            return Ok(Pulled::Suppressed);
        }

        let remote_etag = remote.etag.as_ref().map(ToString::to_string);
        if local.etag.is_some() && local.etag == remote_etag {
            return Ok(Pulled::Unchanged);
        }

        let mut task = local.clone();
        task.data = TaskData::from_vtodo(&remote.todo);
        task.etag = remote_etag;
        task.remote_modified = remote.last_modified;
        task.dirty = false;
        self.store.save_task(&task).await?;
        tracing::debug!(uid = %remote.uid(), etag = ?task.etag, "updated task from server");
        self.events.emit(SyncEvent::TaskUpserted(task));
        Ok(Pulled::Updated)
    }

    async fn pull_new(
        &self,
        collection: &Collection,
        remote: &RemoteTask,
        cutoff: Timestamp,
    ) -> Result<Pulled, StoreError> {
        if let Some(tombstone) = self.store.get_tombstone(collection.id, remote.uid()).await?
            && tombstone.is_live(cutoff)
        {
            tracing::debug!(uid = %remote.uid(), "remote task suppressed by tombstone");
            return Ok(Pulled::Suppressed);
        }

        let draft = NewTask::remote(
            collection.id,
            &remote.todo,
            remote.etag.as_ref().map(ToString::to_string),
            remote.last_modified,
        );
        let task = self.store.insert_task(draft).await?;
        tracing::debug!(uid = %remote.uid(), id = %task.id, "created task from server");
        self.events.emit(SyncEvent::TaskUpserted(task));
        Ok(Pulled::Created)
    }
}

/// Clears the in-flight flag when the pass ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pushed {
    Created,
    Updated,
    Deleted,
    /// Deleted before it ever reached the server.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pulled {
    Created,
    Updated,
    Unchanged,
    Suppressed,
}

#[derive(Debug, thiserror::Error)]
enum ItemFailure {
    #[error(transparent)]
    Remote(#[from] CalDavError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ItemFailure {
    fn kind(&self, remote: ItemErrorKind) -> ItemErrorKind {
        match self {
            Self::Remote(_) => remote,
            Self::Store(_) => ItemErrorKind::Store,
        }
    }
}
