// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for contract parsing and the TAXII error envelope

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while parsing client supplied query parameters
#[derive(Debug, Error)]
pub enum ApiContractError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid next token: {0}")]
    InvalidNext(String),

    #[error("Invalid range header: {0}")]
    InvalidRange(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request scoped failures that are reported to clients
///
/// Every variant maps to exactly one row of [`TaxiiErrorKind::envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxiiErrorKind {
    Unauthenticated,
    NotAcceptable,
    UnsupportedMediaType,
    GetObjectsError,
    ParseObjectsError,
    NotFound,
}

impl TaxiiErrorKind {
    /// All kinds, in table order
    pub const ALL: [TaxiiErrorKind; 6] = [
        TaxiiErrorKind::Unauthenticated,
        TaxiiErrorKind::NotAcceptable,
        TaxiiErrorKind::UnsupportedMediaType,
        TaxiiErrorKind::GetObjectsError,
        TaxiiErrorKind::ParseObjectsError,
        TaxiiErrorKind::NotFound,
    ];

    /// Numeric HTTP status for this kind
    pub fn status_code(self) -> u16 {
        match self {
            TaxiiErrorKind::Unauthenticated => 401,
            TaxiiErrorKind::NotAcceptable => 406,
            TaxiiErrorKind::UnsupportedMediaType => 415,
            TaxiiErrorKind::GetObjectsError => 404,
            TaxiiErrorKind::ParseObjectsError => 400,
            TaxiiErrorKind::NotFound => 404,
        }
    }

    /// The fixed error document for this kind
    pub fn envelope(self) -> TaxiiError {
        let (title, description, http_status) = match self {
            TaxiiErrorKind::Unauthenticated => (
                "Authentication Required",
                "The requested resources requires authentication.",
                "401 Unauthorized",
            ),
            TaxiiErrorKind::NotAcceptable => (
                "Wrong Media Type",
                "The requested media type in the accept header is not supported.",
                "406 Not Acceptable",
            ),
            TaxiiErrorKind::UnsupportedMediaType => (
                "Wrong Media Type",
                "The requested media type in the content-type header is not supported.",
                "415 Unsupported Media Type",
            ),
            TaxiiErrorKind::GetObjectsError => (
                "Get Objects Error",
                "The request for objects caused an error.",
                "404 Not Found",
            ),
            TaxiiErrorKind::ParseObjectsError => (
                "Parse Objects Error",
                "The request parameters or objects could not be parsed.",
                "400 Bad Request",
            ),
            TaxiiErrorKind::NotFound => (
                "No Objects Found",
                "There were no objects returned matching the request.",
                "404 Not Found",
            ),
        };

        TaxiiError {
            title: title.to_string(),
            description: Some(description.to_string()),
            error_code: Some(self.status_code().to_string()),
            http_status: Some(http_status.to_string()),
        }
    }
}

/// TAXII error resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxiiError {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_codes_match_status() {
        for kind in TaxiiErrorKind::ALL {
            let envelope = kind.envelope();
            let code = kind.status_code().to_string();
            assert_eq!(envelope.error_code.as_deref(), Some(code.as_str()));
            assert!(
                envelope.http_status.as_deref().unwrap_or_default().starts_with(&code),
                "status line for {:?} should start with {}",
                kind,
                code
            );
        }
    }

    #[test]
    fn not_acceptable_serializes_with_all_fields() {
        let json = serde_json::to_value(TaxiiErrorKind::NotAcceptable.envelope()).unwrap();
        assert_eq!(json["error_code"], "406");
        assert_eq!(json["http_status"], "406 Not Acceptable");
        assert_eq!(json["title"], "Wrong Media Type");
        assert!(json["description"].is_string());
    }

    #[test]
    fn object_errors_share_404() {
        assert_eq!(TaxiiErrorKind::GetObjectsError.status_code(), 404);
        assert_eq!(TaxiiErrorKind::NotFound.status_code(), 404);
        assert_ne!(
            TaxiiErrorKind::GetObjectsError.envelope().title,
            TaxiiErrorKind::NotFound.envelope().title
        );
    }
}
