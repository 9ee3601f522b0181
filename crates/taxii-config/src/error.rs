// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration errors

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Reasons a configuration is rejected at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("API root {api_root} references unknown collection {collection_id}")]
    UnknownCollection {
        api_root: String,
        collection_id: String,
    },

    #[error("collection {0} is defined more than once")]
    DuplicateCollection(String),

    #[error("discovery service references unknown discovery resource {0}")]
    UnknownDiscoveryResource(String),

    #[error("API root {api_root} references unknown API root resource {resource_id}")]
    UnknownApiRootResource {
        api_root: String,
        resource_id: String,
    },

    #[error("unknown database type {0:?}, supported types are \"sqlite3\" and \"memory\"")]
    UnsupportedBackend(String),

    #[error("storage backend {0} requires global.db_file")]
    MissingDbFile(String),

    #[error("unsupported protocol {0:?}, supported protocols are \"http\" and \"https\"")]
    UnsupportedProtocol(String),

    #[error("protocol https requires global.tls_crt and global.tls_key")]
    MissingTlsFiles,

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("invalid listen address {listen:?}: {source}")]
    InvalidListen {
        listen: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("max_range must be at least 1 ({0})")]
    InvalidMaxRange(String),
}
