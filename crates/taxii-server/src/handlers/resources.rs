// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Data fetch per endpoint kind

use super::{query_params, TaxiiRequest};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use crate::topology::{EndpointDescriptor, Resource};
use axum::http::header;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use taxii_api_contract::{Envelope, Manifest, ObjectFilter, Window};
use taxii_store::StoreResult;

pub(super) async fn fetch(
    state: &AppState,
    endpoint: &EndpointDescriptor,
    request: &TaxiiRequest,
) -> ServerResult<Value> {
    match &endpoint.resource {
        Resource::Discovery(discovery) => to_value(discovery),
        Resource::ApiRoot(api_root) => to_value(api_root),
        Resource::Collections(collections) => to_value(collections),
        Resource::Collection { collection_id } => {
            let entry = bounded(
                state.storage_timeout,
                endpoint.store.get_collection_entry(collection_id),
            )
            .await?
            .ok_or_else(|| ServerError::NotFound(format!("collection {}", collection_id)))?;
            to_value(&entry)
        }
        Resource::Objects { collection_id } => {
            let (filter, window) = selection(endpoint, request)?;
            let page = bounded(
                state.storage_timeout,
                endpoint.store.get_objects(collection_id, &filter, window),
            )
            .await?;
            if page.objects.is_empty() {
                return Err(ServerError::NotFound(format!(
                    "no objects in collection {}",
                    collection_id
                )));
            }
            let next = window.next_token(page.objects.len(), page.total);
            to_value(&Envelope {
                more: next.is_some(),
                next,
                objects: page.objects,
            })
        }
        Resource::ObjectById { collection_id } => {
            let object_id = request
                .object_id
                .as_deref()
                .ok_or_else(|| ServerError::ParseObjects("missing object id".into()))?;
            let (filter, window) = selection(endpoint, request)?;
            let filter = filter.for_object(object_id);
            let page = bounded(
                state.storage_timeout,
                endpoint
                    .store
                    .get_object_by_id(collection_id, object_id, &filter, window),
            )
            .await?;
            if page.objects.is_empty() {
                return Err(ServerError::NotFound(format!(
                    "object {} in collection {}",
                    object_id, collection_id
                )));
            }
            let next = window.next_token(page.objects.len(), page.total);
            to_value(&Envelope {
                more: next.is_some(),
                next,
                objects: page.objects,
            })
        }
        Resource::Manifest { collection_id } => {
            let (filter, window) = selection(endpoint, request)?;
            let page = bounded(
                state.storage_timeout,
                endpoint.store.get_manifest(collection_id, &filter, window),
            )
            .await?;
            if page.entries.is_empty() {
                return Err(ServerError::NotFound(format!(
                    "empty manifest for collection {}",
                    collection_id
                )));
            }
            let next = window.next_token(page.entries.len(), page.total);
            to_value(&Manifest {
                more: next.is_some(),
                next,
                objects: page.entries,
            })
        }
    }
}

/// Filter and window for a collection read, the window capped at the endpoint ceiling
fn selection(endpoint: &EndpointDescriptor, request: &TaxiiRequest) -> ServerResult<(ObjectFilter, Window)> {
    let params = query_params(request)?;
    let range = request
        .headers
        .get(header::RANGE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| ServerError::ParseObjects("Range header is not visible ASCII".into()))
        })
        .transpose()?;

    let filter = params.filter()?;
    let window = params.window(range)?.capped(endpoint.range_max);
    Ok((filter, window))
}

async fn bounded<T, F>(limit: Duration, call: F) -> ServerResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ServerError::GetObjects(format!(
            "storage call did not finish within {:?}",
            limit
        ))),
    }
}

fn to_value<T: Serialize>(resource: &T) -> ServerResult<Value> {
    serde_json::to_value(resource)
        .map_err(|err| ServerError::GetObjects(format!("serializing resource: {}", err)))
}
