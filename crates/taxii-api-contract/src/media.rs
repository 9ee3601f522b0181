// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Media types and `Accept` header parsing

/// Canonical versioned TAXII media type, used for every JSON response
pub const MEDIA_TYPE_TAXII21: &str = "application/taxii+json;version=2.1";

/// STIX media type advertised by collections
pub const MEDIA_TYPE_STIX21: &str = "application/stix+json;version=2.1";

/// HTML media type used when template rendering is enabled
pub const MEDIA_TYPE_HTML: &str = "text/html";

/// Protocol version accepted in the `version` media type parameter
pub const TAXII_VERSION: &str = "2.1";

/// A single media range from an `Accept` or `Content-Type` header
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub main_type: String,
    pub sub_type: String,
    pub params: Vec<(String, String)>,
    pub quality: f32,
}

impl MediaRange {
    /// Parse one media range such as `application/taxii+json;version=2.1;q=0.9`
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(';');
        let essence = parts.next()?.trim();
        let (main_type, sub_type) = essence.split_once('/')?;
        if main_type.is_empty() || sub_type.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        let mut quality = 1.0;
        for param in parts {
            let Some((name, value)) = param.split_once('=') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"').to_string();
            if name == "q" {
                quality = value.parse().unwrap_or(0.0);
            } else {
                params.push((name, value));
            }
        }

        Some(Self {
            main_type: main_type.trim().to_ascii_lowercase(),
            sub_type: sub_type.trim().to_ascii_lowercase(),
            params,
            quality,
        })
    }

    /// Value of a media type parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Whether the range names `application/taxii+json` at the supported version
    ///
    /// A missing `version` parameter means the latest version.
    pub fn is_taxii_json(&self) -> bool {
        self.main_type == "application"
            && self.sub_type == "taxii+json"
            && self.param("version").map_or(true, |v| v == TAXII_VERSION)
    }

    /// `*/*` or `application/*`
    pub fn is_wildcard_for_json(&self) -> bool {
        (self.main_type == "*" && self.sub_type == "*")
            || (self.main_type == "application" && self.sub_type == "*")
    }

    pub fn is_html(&self) -> bool {
        self.main_type == "text" && self.sub_type == "html"
    }
}

/// Parse an `Accept` header into its media ranges, highest quality first
///
/// Ranges with `q=0` are dropped since they explicitly refuse the type.
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = header
        .split(',')
        .filter_map(MediaRange::parse)
        .filter(|range| range.quality > 0.0)
        .collect();
    // Stable sort keeps header order between equal qualities.
    ranges.sort_by(|a, b| b.quality.partial_cmp(&a.quality).unwrap_or(std::cmp::Ordering::Equal));
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_versioned_taxii_type() {
        let range = MediaRange::parse("application/taxii+json;version=2.1").unwrap();
        assert!(range.is_taxii_json());
        assert_eq!(range.param("version"), Some("2.1"));
        assert_eq!(range.quality, 1.0);
    }

    #[test]
    fn rejects_other_taxii_versions() {
        let range = MediaRange::parse("application/taxii+json; version=2.0").unwrap();
        assert!(!range.is_taxii_json());
    }

    #[test]
    fn unversioned_taxii_is_latest() {
        assert!(MediaRange::parse("Application/TAXII+JSON").unwrap().is_taxii_json());
    }

    #[test]
    fn accept_is_sorted_by_quality() {
        let ranges = parse_accept("text/html;q=0.5, application/taxii+json;version=2.1, text/plain;q=0");
        assert_eq!(ranges.len(), 2);
        assert!(ranges[0].is_taxii_json());
        assert!(ranges[1].is_html());
    }

    #[test]
    fn garbage_is_ignored() {
        assert!(parse_accept("nonsense, ;;, /json").is_empty());
    }
}
