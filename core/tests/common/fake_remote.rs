// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! An in-memory `CalDAV` server for engine and scheduler tests.
//!
//! Every write gets a fresh entity tag, failures can be injected per
//! collection or per uid, and every call is recorded so tests can assert on
//! the traffic a pass generated.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use jiff::Timestamp;
use tasksync_caldav::discovery::task_href;
use tasksync_caldav::{
    CalDavError, Discovery, DiscoverySource, ETag, Href, RemoteTask, SkippedResource, TaskFetch,
};
use tasksync_core::RemoteRepository;
use tasksync_ical::VTodo;
use tokio::sync::Semaphore;

/// A request the engine sent to the fake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Discover,
    Fetch(Href),
    Put(Href, String),
    Delete(Href, String),
}

/// How a fetch should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// The server cannot be reached.
    Transport,
    /// The server answers with an error status.
    Status,
}

impl Failure {
    fn error(self) -> CalDavError {
        match self {
            Self::Transport => CalDavError::Transport("connection refused".into()),
            Self::Status => CalDavError::Http("500 Internal Server Error: boom".into()),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<Href, BTreeMap<String, RemoteTask>>,
    skipped: BTreeMap<Href, Vec<SkippedResource>>,
    discovery_error: Option<String>,
    fetch_failures: BTreeMap<Href, Failure>,
    put_failures: HashSet<String>,
    puts_failing: bool,
    delete_failures: HashSet<String>,
    ignore_deletes: bool,
    next_etag: u64,
    calls: Vec<Call>,
}

impl State {
    fn next_etag(&mut self) -> ETag {
        self.next_etag += 1;
        ETag::from(format!("\"etag-{}\"", self.next_etag))
    }
}

/// The fake server.
#[derive(Debug)]
pub struct FakeRemote {
    root: Href,
    state: Mutex<State>,
    gate: Option<Arc<Semaphore>>,
}

#[allow(dead_code)]
impl FakeRemote {
    /// A server whose collection root is `/cal/`, holding the given collections.
    pub fn with_collections(paths: &[&str]) -> Self {
        let state = State {
            collections: paths
                .iter()
                .map(|p| (Href::from(*p), BTreeMap::new()))
                .collect(),
            ..Default::default()
        };
        Self {
            root: Href::from("/cal/"),
            state: Mutex::new(state),
            gate: None,
        }
    }

    /// Like [`FakeRemote::with_collections`], but every discovery waits for a
    /// permit of the returned semaphore, which holds a pass in flight.
    pub fn gated(paths: &[&str]) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut remote = Self::with_collections(paths);
        remote.gate = Some(Arc::clone(&gate));
        (remote, gate)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake remote state poisoned")
    }

    pub fn add_collection(&self, path: &str) {
        self.state()
            .collections
            .entry(Href::from(path))
            .or_default();
    }

    pub fn remove_collection(&self, path: &str) {
        self.state().collections.remove(&Href::from(path));
    }

    /// Stores a to-do as if another client wrote it, returning its new tag.
    pub fn insert(&self, collection: &str, todo: VTodo) -> ETag {
        let mut state = self.state();
        let etag = state.next_etag();
        Self::store(&mut state, &Href::from(collection), todo, etag.clone());
        etag
    }

    /// Stores a to-do under a chosen entity tag.
    pub fn insert_with_etag(&self, collection: &str, todo: VTodo, etag: &str) {
        let mut state = self.state();
        Self::store(&mut state, &Href::from(collection), todo, ETag::from(etag));
    }

    fn store(state: &mut State, collection: &Href, todo: VTodo, etag: ETag) {
        let task = RemoteTask {
            href: task_href(collection, &todo.uid),
            etag: Some(etag),
            last_modified: Some(Timestamp::UNIX_EPOCH),
            todo,
        };
        state
            .collections
            .entry(collection.clone())
            .or_default()
            .insert(task.todo.uid.clone(), task);
    }

    /// Removes a to-do as if another client deleted it.
    pub fn remove(&self, collection: &str, uid: &str) {
        if let Some(tasks) = self.state().collections.get_mut(&Href::from(collection)) {
            tasks.remove(uid);
        }
    }

    /// Adds a resource named `<name>.ics` that fails to parse.
    pub fn add_unreadable(&self, collection: &str, name: &str) {
        let collection = Href::from(collection);
        let resource = SkippedResource {
            href: task_href(&collection, name),
            reason: "missing UID property".into(),
        };
        self.state()
            .skipped
            .entry(collection)
            .or_default()
            .push(resource);
    }

    /// Drops every unreadable resource of a collection.
    pub fn clear_unreadable(&self, collection: &str) {
        self.state().skipped.remove(&Href::from(collection));
    }

    pub fn fail_discovery(&self, reason: &str) {
        self.state().discovery_error = Some(reason.to_string());
    }

    pub fn fail_fetch(&self, collection: &str, failure: Failure) {
        self.state()
            .fetch_failures
            .insert(Href::from(collection), failure);
    }

    pub fn fail_put(&self, uid: &str) {
        self.state().put_failures.insert(uid.to_string());
    }

    /// Makes every write fail, whatever the uid.
    pub fn fail_every_put(&self) {
        self.state().puts_failing = true;
    }

    pub fn fail_delete(&self, uid: &str) {
        self.state().delete_failures.insert(uid.to_string());
    }

    /// Makes deletions succeed without removing anything, like a lagging replica.
    pub fn ignore_deletes(&self) {
        self.state().ignore_deletes = true;
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.discovery_error = None;
        state.fetch_failures.clear();
        state.put_failures.clear();
        state.puts_failing = false;
        state.delete_failures.clear();
    }

    pub fn task(&self, collection: &str, uid: &str) -> Option<RemoteTask> {
        self.state()
            .collections
            .get(&Href::from(collection))
            .and_then(|tasks| tasks.get(uid).cloned())
    }

    pub fn uids(&self, collection: &str) -> Vec<String> {
        self.state()
            .collections
            .get(&Href::from(collection))
            .map(|tasks| tasks.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

#[async_trait]
impl RemoteRepository for FakeRemote {
    async fn discover(&self) -> Discovery {
        self.state().calls.push(Call::Discover);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .expect("gate closed")
                .forget();
        }

        let state = self.state();
        if let Some(reason) = &state.discovery_error {
            return Discovery {
                collections: vec![self.root.clone()],
                display_names: BTreeMap::new(),
                source: DiscoverySource::Failed(reason.clone()),
            };
        }
        if state.collections.is_empty() {
            return Discovery {
                collections: vec![self.root.clone()],
                display_names: BTreeMap::new(),
                source: DiscoverySource::Fallback,
            };
        }
        Discovery {
            collections: state.collections.keys().cloned().collect(),
            display_names: BTreeMap::new(),
            source: DiscoverySource::Root,
        }
    }

    async fn fetch_all(&self, collection: &Href) -> Result<TaskFetch, CalDavError> {
        let mut state = self.state();
        state.calls.push(Call::Fetch(collection.clone()));
        if let Some(failure) = state.fetch_failures.get(collection) {
            return Err(failure.error());
        }

        let tasks = state
            .collections
            .get(collection)
            .ok_or_else(|| CalDavError::NotFound(collection.clone()))?
            .values()
            .cloned()
            .collect();
        let skipped = state.skipped.get(collection).cloned().unwrap_or_default();
        Ok(TaskFetch { tasks, skipped })
    }

    async fn put(&self, collection: &Href, todo: &VTodo) -> Result<ETag, CalDavError> {
        let mut state = self.state();
        state
            .calls
            .push(Call::Put(collection.clone(), todo.uid.clone()));
        if state.puts_failing || state.put_failures.contains(&todo.uid) {
            return Err(Failure::Status.error());
        }
        if !state.collections.contains_key(collection) {
            return Err(CalDavError::NotFound(collection.clone()));
        }

        let etag = state.next_etag();
        Self::store(&mut state, collection, todo.clone(), etag.clone());
        Ok(etag)
    }

    async fn delete(&self, collection: &Href, uid: &str) -> Result<(), CalDavError> {
        let mut state = self.state();
        state
            .calls
            .push(Call::Delete(collection.clone(), uid.to_string()));
        if state.delete_failures.contains(uid) {
            return Err(Failure::Status.error());
        }

        if !state.ignore_deletes
            && let Some(tasks) = state.collections.get_mut(collection)
        {
            tasks.remove(uid);
        }
        Ok(())
    }
}
