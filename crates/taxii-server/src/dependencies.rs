// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Dependency wiring for the TAXII server

use crate::auth::{AuthConfig, AuthGate};
use crate::error::StartupError;
use crate::state::AppState;
use std::path::Path;
use std::sync::Arc;
use taxii_config::{BackendKind, ConfigError, ServerConfig};
use taxii_store::{MemoryStore, SqliteStore, StoreHandle};
use tracing::info;

/// Default dependency builder: storage backend from `global.db_type` and the
/// configured authentication policy
pub struct DefaultServerDependencies {
    state: AppState,
}

impl DefaultServerDependencies {
    pub async fn new(config: &ServerConfig) -> Result<Self, StartupError> {
        let store = open_store(config).await?;
        let auth: Arc<dyn AuthGate> = Arc::new(AuthConfig::from_settings(&config.auth));
        let state = AppState::open(store)
            .with_auth(auth)
            .with_storage_timeout(config.storage_timeout());
        Ok(Self { state })
    }

    /// Seed the storage backend from a JSON file of collection id to STIX objects
    pub async fn seed(self, path: &Path) -> Result<Self, StartupError> {
        taxii_store::load_seed_file(&*self.state.store, path).await?;
        Ok(self)
    }

    /// Consume the dependency builder and return the resulting app state
    pub fn into_state(self) -> AppState {
        self.state
    }
}

/// Open the backend named by `global.db_type`
///
/// Collection entries from the configuration are made available to
/// `get_collection_entry` on both backends.
pub async fn open_store(config: &ServerConfig) -> Result<StoreHandle, StartupError> {
    let collections = config.collection_resources.clone();
    let store = match config.backend()? {
        BackendKind::Memory => StoreHandle::new(MemoryStore::with_collections(collections)),
        BackendKind::Sqlite => {
            let path = config
                .db_path()
                .ok_or_else(|| ConfigError::MissingDbFile(BackendKind::Sqlite.to_string()))?;
            let store = SqliteStore::open(Path::new(&path))?;
            store.sync_collections(collections).await?;
            StoreHandle::new(store)
        }
    };
    info!(backend = store.backend_name(), "storage backend ready");
    Ok(store)
}
