// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! SQLite backend

use crate::filter::{paginate, select};
use crate::{Datastore, ManifestPage, ObjectPage, StoreError, StoreResult, StoredObject};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use taxii_api_contract::{Collection, ObjectFilter, Window};
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    id   TEXT PRIMARY KEY,
    body TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS objects (
    row_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_id TEXT NOT NULL,
    object_id     TEXT NOT NULL,
    object_type   TEXT NOT NULL,
    spec_version  TEXT NOT NULL,
    version       TEXT NOT NULL,
    date_added    TEXT NOT NULL,
    body          TEXT NOT NULL,
    UNIQUE (collection_id, object_id, version)
);

CREATE INDEX IF NOT EXISTS objects_by_collection
    ON objects (collection_id, date_added);

CREATE INDEX IF NOT EXISTS objects_by_type
    ON objects (collection_id, object_type);
"#;

/// Row ids bound per body lookup, below SQLite's host parameter limit
const BODY_BATCH: usize = 500;

/// Backend persisting collections and objects in a SQLite database file
///
/// The connection lives behind a mutex and every query runs on the blocking
/// thread pool, so request tasks never block the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and ensure the schema exists
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened SQLite datastore");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Upsert collection entries so that `get_collection_entry` reflects the configuration
    pub async fn sync_collections(&self, collections: Vec<Collection>) -> StoreResult<()> {
        self.call(move |conn| {
            let tx = conn.unchecked_transaction()?;
            for collection in &collections {
                tx.execute(
                    "INSERT OR REPLACE INTO collections (id, body) VALUES (?1, ?2)",
                    params![collection.id, serde_json::to_string(collection)?],
                )?;
            }
            tx.commit()?;
            debug!(count = collections.len(), "synchronised collections");
            Ok(())
        })
        .await
    }

    async fn call<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            let conn = guard.as_ref().ok_or(StoreError::Closed)?;
            f(conn)
        })
        .await?
    }

    /// Select one page of object versions, returning the unpaginated count too
    async fn page(
        &self,
        collection_id: &str,
        object_id: Option<&str>,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<(Vec<Candidate>, usize)> {
        let query = CandidateQuery::new(collection_id, object_id, filter);
        let filter = filter.clone();
        self.call(move |conn| {
            let (row_ids, objects): (Vec<i64>, Vec<StoredObject>) = query
                .run(conn)?
                .into_iter()
                .map(|candidate| (candidate.row_id, candidate.object))
                .unzip();
            let rows: HashMap<(&str, &str), i64> = objects
                .iter()
                .zip(row_ids)
                .map(|(object, row_id)| ((object.id.as_str(), object.version.as_str()), row_id))
                .collect();

            let (page, total) = paginate(select(&objects, &filter), window);
            let page: Vec<Candidate> = page
                .into_iter()
                .filter_map(|object| {
                    rows.get(&(object.id.as_str(), object.version.as_str()))
                        .map(|row_id| Candidate {
                            row_id: *row_id,
                            object: object.clone(),
                        })
                })
                .collect();
            Ok((page, total))
        })
        .await
    }

    async fn object_page(
        &self,
        collection_id: &str,
        object_id: Option<&str>,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<ObjectPage> {
        let (page, total) = self.page(collection_id, object_id, filter, window).await?;
        let row_ids: Vec<i64> = page.iter().map(|candidate| candidate.row_id).collect();
        let objects: Vec<Value> = self
            .call(move |conn| {
                let mut bodies = load_bodies(conn, &row_ids)?;
                Ok(row_ids.iter().filter_map(|row_id| bodies.remove(row_id)).collect())
            })
            .await?;
        Ok(ObjectPage { objects, total })
    }
}

/// Indexed columns of one stored version; the body stays in the database
struct Candidate {
    row_id: i64,
    object: StoredObject,
}

/// Attribute filters rendered as a SQL `WHERE` clause
struct CandidateQuery {
    sql: String,
    values: Vec<String>,
}

impl CandidateQuery {
    fn new(collection_id: &str, object_id: Option<&str>, filter: &ObjectFilter) -> Self {
        let mut sql = String::from(
            "SELECT row_id, object_id, object_type, spec_version, version, date_added
             FROM objects
             WHERE collection_id = ?",
        );
        let mut values = vec![collection_id.to_string()];

        if let Some(object_id) = object_id {
            sql.push_str(" AND object_id = ?");
            values.push(object_id.to_string());
        }
        for (column, listed) in [
            ("object_id", &filter.ids),
            ("object_type", &filter.types),
            ("spec_version", &filter.spec_versions),
        ] {
            if listed.is_empty() {
                continue;
            }
            sql.push_str(&format!(" AND {} IN ({})", column, placeholders(listed.len())));
            values.extend(listed.iter().cloned());
        }
        if let Some(after) = &filter.added_after {
            sql.push_str(" AND date_added > ?");
            values.push(after.clone());
        }
        sql.push_str(" ORDER BY date_added, row_id");

        Self { sql, values }
    }

    fn run(&self, conn: &Connection) -> StoreResult<Vec<Candidate>> {
        let mut stmt = conn.prepare_cached(&self.sql)?;
        let rows = stmt.query_map(params_from_iter(self.values.iter()), |row| {
            Ok(Candidate {
                row_id: row.get(0)?,
                object: StoredObject {
                    id: row.get(1)?,
                    object_type: row.get(2)?,
                    spec_version: row.get(3)?,
                    version: row.get(4)?,
                    date_added: row.get(5)?,
                    body: Value::Null,
                },
            })
        })?;
        let candidates = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(candidates = candidates.len(), "selected object candidates");
        Ok(candidates)
    }
}

/// Bodies for `row_ids`, parsed; a page is bounded by the range ceiling
fn load_bodies(conn: &Connection, row_ids: &[i64]) -> StoreResult<HashMap<i64, Value>> {
    let mut bodies = HashMap::with_capacity(row_ids.len());
    for chunk in row_ids.chunks(BODY_BATCH) {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT row_id, body FROM objects WHERE row_id IN ({})",
            placeholders(chunk.len())
        ))?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (row_id, body) = row?;
            bodies.insert(row_id, serde_json::from_str(&body)?);
        }
    }
    Ok(bodies)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[async_trait::async_trait]
impl Datastore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite3"
    }

    async fn get_collection_entry(&self, collection_id: &str) -> StoreResult<Option<Collection>> {
        let collection_id = collection_id.to_string();
        self.call(move |conn| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM collections WHERE id = ?1",
                    params![collection_id],
                    |row| row.get(0),
                )
                .optional()?;
            body.map(|body| serde_json::from_str(&body).map_err(StoreError::from))
                .transpose()
        })
        .await
    }

    async fn get_objects(
        &self,
        collection_id: &str,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<ObjectPage> {
        self.object_page(collection_id, None, filter, window).await
    }

    async fn get_object_by_id(
        &self,
        collection_id: &str,
        object_id: &str,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<ObjectPage> {
        self.object_page(collection_id, Some(object_id), filter, window)
            .await
    }

    async fn get_manifest(
        &self,
        collection_id: &str,
        filter: &ObjectFilter,
        window: Window,
    ) -> StoreResult<ManifestPage> {
        let (page, total) = self.page(collection_id, None, filter, window).await?;
        Ok(ManifestPage {
            entries: page
                .iter()
                .map(|candidate| candidate.object.manifest_record())
                .collect(),
            total,
        })
    }

    async fn add_object(&self, collection_id: &str, object: StoredObject) -> StoreResult<()> {
        let collection_id = collection_id.to_string();
        self.call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO objects
                 (collection_id, object_id, object_type, spec_version, version, date_added, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    collection_id,
                    object.id,
                    object.object_type,
                    object.spec_version,
                    object.version,
                    object.date_added,
                    serde_json::to_string(&object.body)?,
                ],
            )?;
            if inserted == 0 {
                debug!(%collection_id, object_id = %object.id, "object version already stored");
            }
            Ok(())
        })
        .await
    }

    async fn close(&self) -> StoreResult<()> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            if let Some(conn) = guard.take() {
                conn.close().map_err(|(_, err)| StoreError::Sqlite(err))?;
                info!("closed SQLite datastore");
            }
            Ok(())
        })
        .await?
    }
}
