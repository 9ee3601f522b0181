// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Storage abstraction for TAXII collections and objects.
//!
//! The server talks to storage only through the [`Datastore`] trait. Two
//! backends are provided: [`SqliteStore`] (persistent, selected with
//! `db_type = "sqlite3"`) and [`MemoryStore`] (selected with
//! `db_type = "memory"`). Both apply the same filter and pagination rules from
//! the [`filter`] module so that clients observe identical results.

pub mod error;
pub mod filter;
pub mod memory;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use taxii_api_contract::{
    format_timestamp, normalize_timestamp, Collection, ManifestRecord, ObjectFilter, Window,
};

/// One version of a STIX object as kept by a backend
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub id: String,
    pub object_type: String,
    pub spec_version: String,
    /// Normalised `modified` (or `created`, or `date_added`) timestamp
    pub version: String,
    pub date_added: String,
    pub body: Value,
}

impl StoredObject {
    /// Extract the indexable fields of a STIX object
    pub fn from_value(body: Value, date_added: DateTime<Utc>) -> StoreResult<Self> {
        let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);

        let id = field("id").ok_or_else(|| StoreError::InvalidObject("missing id".into()))?;
        let object_type = match field("type") {
            Some(object_type) => object_type,
            None => id
                .split_once("--")
                .map(|(prefix, _)| prefix.to_string())
                .ok_or_else(|| StoreError::InvalidObject(format!("{}: missing type", id)))?,
        };
        let spec_version = field("spec_version").unwrap_or_else(|| "2.1".to_string());

        let date_added = format_timestamp(date_added);
        let version = match field("modified").or_else(|| field("created")) {
            Some(raw) => normalize_timestamp(&raw).unwrap_or(raw),
            None => date_added.clone(),
        };

        Ok(Self {
            id,
            object_type,
            spec_version,
            version,
            date_added,
            body,
        })
    }

    /// Manifest entry describing this object version
    pub fn manifest_record(&self) -> ManifestRecord {
        ManifestRecord {
            id: self.id.clone(),
            date_added: self.date_added.clone(),
            version: self.version.clone(),
            media_type: Some(format!("application/stix+json;version={}", self.spec_version)),
        }
    }
}

/// A page of objects plus the number of matches before pagination
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPage {
    pub objects: Vec<Value>,
    pub total: usize,
}

/// A page of manifest entries plus the number of matches before pagination
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestPage {
    pub entries: Vec<ManifestRecord>,
    pub total: usize,
}

/// Storage interface used by the request handlers
///
/// Implementations must be safe to call concurrently from many request tasks.
#[async_trait::async_trait]
pub trait Datastore: Send + Sync {
    /// Backend name as written in `global.db_type`
    fn backend_name(&self) -> &'static str;

    async fn get_collection_entry(&self, collection_id: &str) -> StoreResult<Option<Collection>>;

    async fn get_objects(
        &self,
        collection_id: &str,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<ObjectPage>;

    /// Versions of one object selected by `filter`; empty when the object is unknown
    async fn get_object_by_id(
        &self,
        collection_id: &str,
        object_id: &str,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<ObjectPage>;

    async fn get_manifest(
        &self,
        collection_id: &str,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<ManifestPage>;

    /// Add one object version to a collection; an existing version is left untouched
    async fn add_object(&self, collection_id: &str, object: StoredObject) -> StoreResult<()>;

    /// Release the backend; later calls fail with [`StoreError::Closed`]
    async fn close(&self) -> StoreResult<()>;
}

/// Shared handle to the storage backend bound into every endpoint
#[derive(Clone)]
pub struct StoreHandle(Arc<dyn Datastore>);

impl StoreHandle {
    pub fn new<D: Datastore + 'static>(store: D) -> Self {
        Self(Arc::new(store))
    }

    /// True when both handles point at the same backend instance
    pub fn same_backend(&self, other: &StoreHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Arc<dyn Datastore>> for StoreHandle {
    fn from(store: Arc<dyn Datastore>) -> Self {
        Self(store)
    }
}

impl Deref for StoreHandle {
    type Target = dyn Datastore;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StoreHandle").field(&self.0.backend_name()).finish()
    }
}

/// Load objects from a JSON file mapping collection ids to arrays of STIX objects
///
/// Every object is stamped with the same `date_added`. Returns the number of
/// objects read.
pub async fn load_seed_file(store: &dyn Datastore, path: &Path) -> StoreResult<usize> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let seed: HashMap<String, Vec<Value>> = serde_json::from_str(&content)?;

    let now = Utc::now();
    let mut count = 0;
    for (collection_id, objects) in seed {
        for body in objects {
            store
                .add_object(&collection_id, StoredObject::from_value(body, now)?)
                .await?;
            count += 1;
        }
    }

    tracing::info!(
        path = %path.display(),
        backend = store.backend_name(),
        objects = count,
        "loaded seed objects"
    );
    Ok(count)
}
