// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory backend (for development/testing)

use crate::filter::{paginate, select};
use crate::{Datastore, ManifestPage, ObjectPage, StoreError, StoreResult, StoredObject};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use taxii_api_contract::{Collection, ObjectFilter, Window};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Collection>,
    objects: HashMap<String, Vec<StoredObject>>,
}

/// Backend keeping every collection in process memory
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with collection entries
    pub fn with_collections<I>(collections: I) -> Self
    where
        I: IntoIterator<Item = Collection>,
    {
        let inner = Inner {
            collections: collections
                .into_iter()
                .map(|collection| (collection.id.clone(), collection))
                .collect(),
            objects: HashMap::new(),
        };
        Self {
            inner: RwLock::new(inner),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    async fn selected(&self, collection_id: &str, filter: &ObjectFilter) -> StoreResult<Vec<StoredObject>> {
        self.ensure_open()?;
        let inner = self.inner.read().await;
        let objects = match inner.objects.get(collection_id) {
            Some(objects) => objects,
            None => return Ok(Vec::new()),
        };
        Ok(select(objects, filter).into_iter().cloned().collect())
    }
}

#[async_trait::async_trait]
impl Datastore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_collection_entry(&self, collection_id: &str) -> StoreResult<Option<Collection>> {
        self.ensure_open()?;
        let inner = self.inner.read().await;
        Ok(inner.collections.get(collection_id).cloned())
    }

    async fn get_objects(
        &self,
        collection_id: &str,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<ObjectPage> {
        let (page, total) = paginate(self.selected(collection_id, filter).await?, window);
        Ok(ObjectPage {
            objects: page.into_iter().map(|object| object.body).collect(),
            total,
        })
    }

    async fn get_object_by_id(
        &self,
        collection_id: &str,
        object_id: &str,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<ObjectPage> {
        let filter = filter.clone().for_object(object_id);
        self.get_objects(collection_id, &filter, window).await
    }

    async fn get_manifest(
        &self,
        collection_id: &str,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<ManifestPage> {
        let (page, total) = paginate(self.selected(collection_id, filter).await?, window);
        Ok(ManifestPage {
            entries: page.iter().map(StoredObject::manifest_record).collect(),
            total,
        })
    }

    async fn add_object(&self, collection_id: &str, object: StoredObject) -> StoreResult<()> {
        self.ensure_open()?;
        let mut inner = self.inner.write().await;
        let objects = inner.objects.entry(collection_id.to_string()).or_default();
        if objects
            .iter()
            .any(|existing| existing.id == object.id && existing.version == object.version)
        {
            debug!(collection_id, object_id = %object.id, "object version already stored");
            return Ok(());
        }
        objects.push(object);
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use std::io::Write;
    use taxii_api_contract::VersionMatch;

    fn collection(id: &str) -> Collection {
        serde_json::from_value(json!({ "id": id, "title": id, "can_read": true })).unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::with_collections([collection("col-1")]);
        for (day, id, modified) in [
            (1, "indicator--1", "2024-01-01T00:00:00Z"),
            (2, "indicator--1", "2024-02-01T00:00:00Z"),
            (3, "malware--1", "2024-01-15T00:00:00Z"),
            (4, "indicator--2", "2024-01-20T00:00:00Z"),
        ] {
            let body = json!({ "type": id.split("--").next().unwrap(), "id": id, "modified": modified });
            store
                .add_object("col-1", StoredObject::from_value(body, at(day)).unwrap())
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn collection_entry_lookup() {
        let store = seeded().await;
        assert!(store.get_collection_entry("col-1").await.unwrap().is_some());
        assert!(store.get_collection_entry("col-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn objects_are_paginated_with_total() {
        let store = seeded().await;
        let page = store
            .get_objects("col-1", &ObjectFilter::default(), Window { offset: 0, limit: Some(2) })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.objects.len(), 2);
        assert_eq!(page.objects[0]["id"], "indicator--1");
    }

    #[tokio::test]
    async fn unknown_collection_is_empty_not_error() {
        let store = seeded().await;
        let page = store
            .get_objects("missing", &ObjectFilter::default(), Window::default())
            .await
            .unwrap();
        assert_eq!(page, ObjectPage::default());
    }

    #[tokio::test]
    async fn object_by_id_returns_all_versions_when_asked() {
        let store = seeded().await;
        let filter = ObjectFilter {
            versions: vec![VersionMatch::All],
            ..ObjectFilter::default()
        };
        let page = store
            .get_object_by_id("col-1", "indicator--1", &filter, Window::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let missing = store
            .get_object_by_id("col-1", "indicator--9", &filter, Window::default())
            .await
            .unwrap();
        assert!(missing.objects.is_empty());
    }

    #[tokio::test]
    async fn manifest_lists_latest_versions() {
        let store = seeded().await;
        let manifest = store
            .get_manifest("col-1", &ObjectFilter::default(), Window::default())
            .await
            .unwrap();
        assert_eq!(manifest.total, 3);
        assert_eq!(manifest.entries[0].version, "2024-02-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn duplicate_versions_are_ignored() {
        let store = seeded().await;
        let body = json!({ "type": "malware", "id": "malware--1", "modified": "2024-01-15T00:00:00Z" });
        store
            .add_object("col-1", StoredObject::from_value(body, at(9)).unwrap())
            .await
            .unwrap();
        let page = store
            .get_objects("col-1", &ObjectFilter::default().for_object("malware--1"), Window::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn seed_file_populates_collections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({ "col-2": [{ "type": "indicator", "id": "indicator--7" }] })
        )
        .unwrap();

        let store = MemoryStore::new();
        assert_eq!(crate::load_seed_file(&store, file.path()).await.unwrap(), 1);
        let page = store
            .get_objects("col-2", &ObjectFilter::default(), Window::default())
            .await
            .unwrap();
        assert_eq!(page.objects[0]["id"], "indicator--7");
    }

    #[tokio::test]
    async fn closed_store_rejects_calls() {
        let store = seeded().await;
        store.close().await.unwrap();
        assert!(matches!(
            store.get_collection_entry("col-1").await,
            Err(StoreError::Closed)
        ));
    }
}
