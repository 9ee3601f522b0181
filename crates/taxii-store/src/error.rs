// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failures
///
/// Request handlers report every variant to clients as a Get Objects Error;
/// the detail is only logged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid STIX object: {0}")]
    InvalidObject(String),

    #[error("storage backend is closed")]
    Closed,

    #[error("storage connection lock poisoned")]
    Poisoned,

    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
