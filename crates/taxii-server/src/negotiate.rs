// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Media type negotiation

use crate::error::{ServerError, ServerResult};
use axum::http::{header, HeaderMap};
use taxii_api_contract::{parse_accept, MediaRange};

/// Representation chosen for a successful response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    TaxiiJson,
    Html,
}

/// Pick the response representation from the `Accept` header
///
/// Ranges are tried from highest quality down. TAXII JSON (unversioned or
/// version 2.1), `application/*` and `*/*` select JSON; `text/html` selects
/// HTML only when the endpoint has HTML enabled. A request without `Accept`
/// gets JSON.
pub fn negotiate_accept(headers: &HeaderMap, html_enabled: bool) -> ServerResult<Representation> {
    let mut values = Vec::new();
    for value in headers.get_all(header::ACCEPT) {
        let value = value
            .to_str()
            .map_err(|_| ServerError::NotAcceptable("Accept header is not visible ASCII".into()))?;
        values.push(value);
    }
    let accept = values.join(",");
    if accept.trim().is_empty() {
        return Ok(Representation::TaxiiJson);
    }

    parse_accept(&accept)
        .iter()
        .find_map(|range| choose(range, html_enabled))
        .ok_or(ServerError::NotAcceptable(accept))
}

fn choose(range: &MediaRange, html_enabled: bool) -> Option<Representation> {
    if range.is_taxii_json() || range.is_wildcard_for_json() {
        Some(Representation::TaxiiJson)
    } else if html_enabled && range.is_html() {
        Some(Representation::Html)
    } else {
        None
    }
}

/// Reject request bodies that are not TAXII JSON
///
/// Only applies when the request carries a body.
pub fn check_content_type(headers: &HeaderMap) -> ServerResult<()> {
    let has_body = headers.contains_key(header::TRANSFER_ENCODING)
        || headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .is_some_and(|length| length > 0);
    if !has_body {
        return Ok(());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    match MediaRange::parse(content_type) {
        Some(range) if range.is_taxii_json() => Ok(()),
        _ => Err(ServerError::UnsupportedMediaType(content_type.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn taxii_json_variants_are_accepted() {
        for value in [
            "application/taxii+json;version=2.1",
            "application/taxii+json",
            "application/*",
            "*/*",
        ] {
            assert_eq!(
                negotiate_accept(&accept(value), false).unwrap(),
                Representation::TaxiiJson,
                "{}",
                value
            );
        }
    }

    #[test]
    fn missing_accept_defaults_to_json() {
        assert_eq!(
            negotiate_accept(&HeaderMap::new(), true).unwrap(),
            Representation::TaxiiJson
        );
    }

    #[test]
    fn unsupported_types_are_not_acceptable() {
        for value in ["text/plain", "application/taxii+json;version=2.0", "application/json"] {
            let err = negotiate_accept(&accept(value), true).unwrap_err();
            assert!(matches!(err, ServerError::NotAcceptable(_)), "{}", value);
        }
    }

    #[test]
    fn html_only_when_enabled() {
        assert_eq!(
            negotiate_accept(&accept("text/html"), true).unwrap(),
            Representation::Html
        );
        assert!(negotiate_accept(&accept("text/html"), false).is_err());
    }

    #[test]
    fn browser_accept_prefers_html_when_enabled() {
        let browser = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
        assert_eq!(
            negotiate_accept(&accept(browser), true).unwrap(),
            Representation::Html
        );
        assert_eq!(
            negotiate_accept(&accept(browser), false).unwrap(),
            Representation::TaxiiJson
        );
    }

    #[test]
    fn quality_ordering_wins() {
        let value = "text/html;q=0.4, application/taxii+json;version=2.1;q=0.9";
        assert_eq!(
            negotiate_accept(&accept(value), true).unwrap(),
            Representation::TaxiiJson
        );
    }

    #[test]
    fn bodies_must_be_taxii_json() {
        let mut headers = HeaderMap::new();
        assert!(check_content_type(&headers).is_ok());

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(matches!(
            check_content_type(&headers),
            Err(ServerError::UnsupportedMediaType(_))
        ));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/taxii+json;version=2.1"),
        );
        assert!(check_content_type(&headers).is_ok());
    }
}
