// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration model

use crate::error::ConfigError;
use crate::html::HtmlSettings;
use crate::tristate::Tristate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use taxii_api_contract::{ApiRoot, Collection, Discovery};

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub global: GlobalSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    /// Deployment-wide HTML defaults
    #[serde(default)]
    pub html: HtmlSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<DiscoveryService>,

    #[serde(default)]
    pub api_root_server: ApiRootServer,

    #[serde(default)]
    pub discovery_resources: BTreeMap<String, Discovery>,

    #[serde(default)]
    pub api_root_resources: BTreeMap<String, ApiRoot>,

    /// Known collections, in declaration order
    #[serde(default)]
    pub collection_resources: Vec<Collection>,
}

impl ServerConfig {
    /// Look up a collection definition by id
    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collection_resources.iter().find(|collection| collection.id == id)
    }

    /// Listen address as a socket address
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.global.listen.parse().map_err(|source| ConfigError::InvalidListen {
            listen: self.global.listen.clone(),
            source,
        })
    }

    /// Transport protocol selected by `global.protocol`
    pub fn transport(&self) -> Result<Transport, ConfigError> {
        self.global.protocol.parse()
    }

    /// Storage backend selected by `global.db_type`
    pub fn backend(&self) -> Result<BackendKind, ConfigError> {
        self.global.db_type.parse()
    }

    /// Path of the storage location, below the filesystem prefix
    pub fn db_path(&self) -> Option<String> {
        self.global.db_file.as_ref().map(|file| self.prefixed(file))
    }

    /// Prepend the filesystem prefix to `path` by strict concatenation
    pub fn prefixed(&self, path: &str) -> String {
        format!("{}{}", self.global.prefix, path)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.global.storage_timeout_secs)
    }
}

/// Deployment-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    /// Filesystem prefix for the database, TLS files and templates
    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_crt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_key: Option<String>,

    pub db_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_file: Option<String>,

    /// Pagination ceiling applied when an API root does not set its own
    #[serde(default = "default_max_range")]
    pub max_range: usize,

    #[serde(default = "default_storage_timeout_secs")]
    pub storage_timeout_secs: u64,
}

fn default_listen() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_max_range() -> usize {
    100
}

fn default_storage_timeout_secs() -> u64 {
    10
}

/// Log file settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

/// Credentials for the default authentication gate
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// The discovery endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryService {
    #[serde(default)]
    pub enabled: bool,
    /// Full URL path, e.g. `/taxii2/`
    pub path: String,
    pub resource_id: String,
    #[serde(default)]
    pub html: HtmlSettings,
}

/// Outer switch and ordered list of API roots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiRootServer {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub services: Vec<ApiRootService>,
}

/// One API root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiRootService {
    #[serde(default)]
    pub enabled: bool,
    /// Full URL path, e.g. `/api1/`
    pub path: String,
    pub resource_id: String,
    #[serde(default)]
    pub collections: CollectionsService,
    #[serde(default)]
    pub html: HtmlSettings,
    #[serde(default, skip_serializing_if = "Tristate::is_unset")]
    pub max_range: Tristate<usize>,
}

impl ApiRootService {
    /// Path of this root's Collections endpoint
    pub fn collections_path(&self) -> String {
        format!("{}{}", self.path, self.collections.path)
    }

    /// Pagination ceiling after inheriting from the global setting
    pub fn max_range(&self, global: &GlobalSettings) -> usize {
        self.max_range
            .inherit(&Tristate::Value(global.max_range))
            .value_or(default_max_range())
    }
}

/// The Collections service embedded in an API root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionsService {
    #[serde(default)]
    pub enabled: bool,
    /// Segment appended to the API root path
    #[serde(default = "default_collections_path")]
    pub path: String,
    /// Collection ids served by this root, in order
    #[serde(default)]
    pub resource_ids: Vec<String>,
}

impl Default for CollectionsService {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_collections_path(),
            resource_ids: Vec::new(),
        }
    }
}

fn default_collections_path() -> String {
    "collections/".to_string()
}

/// Supported transport protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    Https,
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Transport::Http),
            "https" => Ok(Transport::Https),
            other => Err(ConfigError::UnsupportedProtocol(other.to_string())),
        }
    }
}

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    Memory,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite3" => Ok(BackendKind::Sqlite),
            "memory" => Ok(BackendKind::Memory),
            other => Err(ConfigError::UnsupportedBackend(other.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite3"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}
