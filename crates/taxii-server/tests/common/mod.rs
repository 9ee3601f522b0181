// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use taxii_config::ServerConfig;
use taxii_server::auth::AuthGate;
use taxii_server::{AppState, Server};
use taxii_store::{Datastore, MemoryStore, StoreHandle, StoredObject};

pub const TAXII: &str = "application/taxii+json;version=2.1";

/// Memory backed configuration with one discovery service, one API root and
/// two collections, the second one not readable
pub fn config_json() -> Value {
    json!({
        "global": { "db_type": "memory", "max_range": 3 },
        "discovery": { "enabled": true, "path": "/taxii2/", "resource_id": "discovery--1" },
        "api_root_server": {
            "enabled": true,
            "services": [{
                "enabled": true,
                "path": "/api1/",
                "resource_id": "apiroot--1",
                "collections": { "enabled": true, "resource_ids": ["col-1", "col-hidden"] }
            }]
        },
        "discovery_resources": {
            "discovery--1": { "title": "Test TAXII server", "api_roots": ["/api1/"] }
        },
        "api_root_resources": { "apiroot--1": { "title": "API Root 1" } },
        "collection_resources": [
            { "id": "col-1", "title": "Indicators", "can_read": true },
            { "id": "col-hidden", "title": "Hidden", "can_read": false }
        ]
    })
}

pub fn parse(value: &Value) -> ServerConfig {
    taxii_config::from_json_str(&value.to_string()).expect("valid configuration")
}

/// Four indicators in `col-1`; `indicator--1` has two versions
pub async fn seeded_store(config: &ServerConfig) -> StoreHandle {
    let store = MemoryStore::with_collections(config.collection_resources.clone());
    let objects = [
        (1, "indicator--1", "2024-01-01T00:00:00.000Z"),
        (2, "indicator--1", "2024-02-01T00:00:00.000Z"),
        (3, "indicator--2", "2024-01-10T00:00:00.000Z"),
        (4, "indicator--3", "2024-01-11T00:00:00.000Z"),
        (5, "indicator--4", "2024-01-12T00:00:00.000Z"),
    ];
    for (day, id, modified) in objects {
        let body = json!({
            "type": "indicator",
            "spec_version": "2.1",
            "id": id,
            "created": "2024-01-01T00:00:00.000Z",
            "modified": modified,
            "pattern": "[ipv4-addr:value = '198.51.100.1']",
            "pattern_type": "stix"
        });
        let added = Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap();
        store
            .add_object("col-1", StoredObject::from_value(body, added).unwrap())
            .await
            .unwrap();
    }
    StoreHandle::new(store)
}

pub async fn app(config: &ServerConfig) -> Router {
    let state = AppState::open(seeded_store(config).await);
    Server::with_state(config, state).expect("server").router()
}

pub async fn app_with_auth(config: &ServerConfig, auth: Arc<dyn AuthGate>) -> Router {
    let state = AppState::open(seeded_store(config).await).with_auth(auth);
    Server::with_state(config, state).expect("server").router()
}

pub fn get(path: &str, accept: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(accept) = accept {
        builder = builder.header(header::ACCEPT, accept);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("JSON body")
}
