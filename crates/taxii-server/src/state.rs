// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server state management

use crate::auth::{AllowAll, AuthGate};
use std::sync::Arc;
use std::time::Duration;
use taxii_store::StoreHandle;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    /// Authentication policy
    pub auth: Arc<dyn AuthGate>,

    /// Storage backend bound into the endpoint descriptors
    pub store: StoreHandle,

    /// Upper bound on a single storage call
    pub storage_timeout: Duration,
}

impl AppState {
    /// Open state over `store` with no authentication
    pub fn open(store: StoreHandle) -> Self {
        Self {
            auth: Arc::new(AllowAll),
            store,
            storage_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthGate>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("storage_timeout", &self.storage_timeout)
            .finish_non_exhaustive()
    }
}
