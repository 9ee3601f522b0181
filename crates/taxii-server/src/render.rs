// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Response rendering

use crate::negotiate::Representation;
use crate::topology::EndpointDescriptor;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::path::PathBuf;
use taxii_api_contract::{MEDIA_TYPE_HTML, MEDIA_TYPE_TAXII21};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("reading template {path:?}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing resource: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render `resource` in the negotiated representation
///
/// A failed HTML render is logged and answered with TAXII JSON instead.
pub async fn render(
    endpoint: &EndpointDescriptor,
    representation: Representation,
    request_path: &str,
    resource: &Value,
) -> Response {
    if representation == Representation::Html {
        match render_html(&endpoint.html.template, endpoint, request_path, resource).await {
            Ok(page) => {
                return (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))],
                    page,
                )
                    .into_response();
            }
            Err(err) => {
                tracing::warn!(
                    path = %endpoint.path,
                    template = %endpoint.html.template,
                    error = %err,
                    "HTML rendering failed, falling back to JSON"
                );
            }
        }
    }

    json_response(resource)
}

/// Resource as a TAXII JSON response
pub fn json_response(resource: &Value) -> Response {
    match serde_json::to_vec(resource) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE_TAXII21))],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize resource");
            crate::error::emit(taxii_api_contract::TaxiiErrorKind::GetObjectsError)
        }
    }
}

async fn render_html(
    template_path: &str,
    endpoint: &EndpointDescriptor,
    request_path: &str,
    resource: &Value,
) -> Result<String, RenderError> {
    let template = tokio::fs::read_to_string(template_path)
        .await
        .map_err(|source| RenderError::Template {
            path: PathBuf::from(template_path),
            source,
        })?;

    let title = resource
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(endpoint.kind().as_str());
    let pretty = serde_json::to_string_pretty(resource)?;

    Ok(fill(
        &template,
        &[
            ("title", title),
            ("kind", endpoint.kind().as_str()),
            ("path", request_path),
            ("media_type", MEDIA_TYPE_HTML),
            ("resource", &pretty),
        ],
    ))
}

/// Replace `{{name}}` placeholders with HTML-escaped values
///
/// Unknown placeholders are left as they are.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after[..end].trim();
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(&escape_html(value)),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_substitutes_and_escapes() {
        let page = fill(
            "<h1>{{ title }}</h1><pre>{{resource}}</pre>{{unknown}}",
            &[("title", "A & B"), ("resource", "{\"id\":\"<x>\"}")],
        );
        assert_eq!(
            page,
            "<h1>A &amp; B</h1><pre>{&quot;id&quot;:&quot;&lt;x&gt;&quot;}</pre>{{unknown}}"
        );
    }

    #[test]
    fn fill_keeps_unterminated_placeholder() {
        assert_eq!(fill("a {{title", &[("title", "x")]), "a {{title");
    }
}
