// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Request handling shared by every endpoint kind
//!
//! A request moves through authentication, media type negotiation and the
//! kind-specific data fetch before it is rendered. The first failing step
//! decides the error envelope; later steps never run.

mod resources;

use crate::error::{ServerError, ServerResult};
use crate::negotiate::{check_content_type, negotiate_accept};
use crate::render;
use crate::state::AppState;
use crate::topology::EndpointDescriptor;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use taxii_api_contract::ObjectQueryParams;

/// The parts of an HTTP request the handlers look at
#[derive(Debug, Clone)]
pub struct TaxiiRequest {
    pub path: String,
    pub headers: HeaderMap,
    /// Decoded query string, or the reason it could not be decoded
    pub query: Result<ObjectQueryParams, String>,
    /// Object id captured from an Object-by-ID path
    pub object_id: Option<String>,
}

impl TaxiiRequest {
    pub fn new(path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            path: path.into(),
            headers,
            query: Ok(ObjectQueryParams::default()),
            object_id: None,
        }
    }
}

/// Serve one request against `endpoint`
pub async fn handle(state: AppState, endpoint: &EndpointDescriptor, request: TaxiiRequest) -> Response {
    match execute(&state, endpoint, &request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::info!(
                path = %request.path,
                kind = %endpoint.kind(),
                error = %err,
                "request failed"
            );
            err.into_response()
        }
    }
}

async fn execute(
    state: &AppState,
    endpoint: &EndpointDescriptor,
    request: &TaxiiRequest,
) -> ServerResult<Response> {
    state.auth.authenticate(&request.headers)?;
    let representation = negotiate_accept(&request.headers, endpoint.html.enabled)?;
    check_content_type(&request.headers)?;

    let resource = resources::fetch(state, endpoint, request).await?;
    tracing::debug!(
        path = %request.path,
        kind = %endpoint.kind(),
        ?representation,
        "serving resource"
    );
    Ok(render::render(endpoint, representation, &request.path, &resource).await)
}

/// Query parameters for endpoints that read them, rejecting undecodable ones
fn query_params(request: &TaxiiRequest) -> ServerResult<&ObjectQueryParams> {
    request
        .query
        .as_ref()
        .map_err(|reason| ServerError::ParseObjects(reason.clone()))
}
