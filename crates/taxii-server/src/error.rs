// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server error types and the TAXII error envelope

use crate::topology::AssemblyError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use taxii_api_contract::{ApiContractError, TaxiiErrorKind, MEDIA_TYPE_TAXII21};
use taxii_config::ConfigError;
use taxii_store::StoreError;

/// Request handling result type
pub type ServerResult<T> = Result<T, ServerError>;

/// Request scoped failures
///
/// Each variant maps to exactly one [`TaxiiErrorKind`]; the message is logged
/// and never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("authentication failed: {0}")]
    Unauthenticated(String),

    #[error("no acceptable media type: {0}")]
    NotAcceptable(String),

    #[error("unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("storage request failed: {0}")]
    GetObjects(String),

    #[error("invalid request parameters: {0}")]
    ParseObjects(String),

    #[error("nothing found: {0}")]
    NotFound(String),
}

impl ServerError {
    pub fn kind(&self) -> TaxiiErrorKind {
        match self {
            ServerError::Unauthenticated(_) => TaxiiErrorKind::Unauthenticated,
            ServerError::NotAcceptable(_) => TaxiiErrorKind::NotAcceptable,
            ServerError::UnsupportedMediaType(_) => TaxiiErrorKind::UnsupportedMediaType,
            ServerError::GetObjects(_) => TaxiiErrorKind::GetObjectsError,
            ServerError::ParseObjects(_) => TaxiiErrorKind::ParseObjectsError,
            ServerError::NotFound(_) => TaxiiErrorKind::NotFound,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        emit(self.kind())
    }
}

impl From<ApiContractError> for ServerError {
    fn from(err: ApiContractError) -> Self {
        ServerError::ParseObjects(err.to_string())
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        ServerError::GetObjects(err.to_string())
    }
}

/// Write the fixed error document for `kind`
///
/// Error bodies are always TAXII JSON, whatever representation was negotiated.
pub fn emit(kind: TaxiiErrorKind) -> Response {
    let status = StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match serde_json::to_vec(&kind.envelope()) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(?kind, error = %err, "failed to serialize error envelope");
            Vec::new()
        }
    };
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE_TAXII21))],
        body,
    )
        .into_response()
}

/// Failures that stop the server before or while serving
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("storage backend: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("binding {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("loading TLS certificate {cert} and key {key}: {source}")]
    Tls {
        cert: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn not_acceptable_envelope() {
        let response = ServerError::NotAcceptable("text/plain".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            MEDIA_TYPE_TAXII21
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error_code"], "406");
        assert_eq!(json["http_status"], "406 Not Acceptable");
    }

    #[tokio::test]
    async fn every_kind_emits_matching_status() {
        for kind in TaxiiErrorKind::ALL {
            let response = emit(kind);
            assert_eq!(response.status().as_u16(), kind.status_code());
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error_code"], kind.status_code().to_string());
        }
    }

    #[test]
    fn internal_errors_map_to_kinds() {
        let err: ServerError = ApiContractError::InvalidLimit("x".into()).into();
        assert_eq!(err.kind(), TaxiiErrorKind::ParseObjectsError);

        let err: ServerError = StoreError::Closed.into();
        assert_eq!(err.kind(), TaxiiErrorKind::GetObjectsError);
    }
}
