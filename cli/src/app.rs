// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, sync::Arc};

use tasksync_caldav::CalDavClient;
use tasksync_core::{LocalStore, SqliteStore, SyncConfig, SyncEngine};

/// The wired-up service: configuration, local database, server client and engine.
#[derive(Debug)]
pub struct App {
    config: SyncConfig,
    store: SqliteStore,
    client: Arc<CalDavClient>,
    engine: Arc<SyncEngine>,
}

impl App {
    /// Opens the database and connects the engine to the server.
    pub async fn new(config: SyncConfig) -> Result<Self, Box<dyn Error>> {
        let store = SqliteStore::open(config.database.as_deref()).await?;
        let client = Arc::new(CalDavClient::new(config.caldav_config())?);
        let engine = Arc::new(SyncEngine::new(
            Arc::new(store.clone()) as Arc<dyn LocalStore>,
            Arc::clone(&client) as _,
            config.sync_options(),
        ));

        tracing::debug!(server = %config.server_url, root = %config.collection_root(), "app ready");
        Ok(Self {
            config,
            store,
            client,
            engine,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn client(&self) -> &CalDavClient {
        &self.client
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Closes the database.
    pub async fn close(self) {
        self.store.close().await;
    }
}
