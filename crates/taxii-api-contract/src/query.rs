// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Filtering and pagination parameters for object and manifest requests

use crate::error::ApiContractError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Raw query string of the Objects, Object-by-ID and Manifest endpoints
///
/// Every field stays a string so that malformed values surface as a parse
/// error from [`ObjectQueryParams::filter`] rather than as an extractor rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_after: Option<String>,
    #[serde(rename = "match[id]", skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
    #[serde(rename = "match[type]", skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    #[serde(rename = "match[version]", skip_serializing_if = "Option::is_none")]
    pub match_version: Option<String>,
    #[serde(rename = "match[spec_version]", skip_serializing_if = "Option::is_none")]
    pub match_spec_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Which versions of an object to return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionMatch {
    Last,
    First,
    All,
    At(String),
}

/// Parsed object filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFilter {
    /// Normalised to millisecond RFC 3339 so stored `date_added` strings compare lexically
    pub added_after: Option<String>,
    pub ids: Vec<String>,
    pub types: Vec<String>,
    pub versions: Vec<VersionMatch>,
    pub spec_versions: Vec<String>,
}

impl Default for ObjectFilter {
    fn default() -> Self {
        Self {
            added_after: None,
            ids: Vec::new(),
            types: Vec::new(),
            versions: vec![VersionMatch::Last],
            spec_versions: Vec::new(),
        }
    }
}

impl ObjectFilter {
    /// Restrict the filter to a single object id
    pub fn for_object(mut self, object_id: &str) -> Self {
        self.ids = vec![object_id.to_string()];
        self
    }
}

/// Pagination window requested by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Window {
    /// Cap the window at `ceiling` items regardless of what the client asked for
    pub fn capped(self, ceiling: usize) -> Self {
        let limit = self.limit.map_or(ceiling, |limit| limit.min(ceiling));
        Self {
            offset: self.offset,
            limit: Some(limit),
        }
    }

    /// Token for the page following `returned` items, when more remain
    pub fn next_token(&self, returned: usize, total: usize) -> Option<String> {
        let end = self.offset + returned;
        (end < total).then(|| end.to_string())
    }
}

impl ObjectQueryParams {
    /// Build the object filter from the `match[...]` and `added_after` parameters
    pub fn filter(&self) -> Result<ObjectFilter, ApiContractError> {
        let added_after = self
            .added_after
            .as_deref()
            .map(normalize_timestamp)
            .transpose()?;

        let versions = match self.match_version.as_deref() {
            None => vec![VersionMatch::Last],
            Some(raw) => split_list(raw)
                .into_iter()
                .map(|value| match value.as_str() {
                    "last" => Ok(VersionMatch::Last),
                    "first" => Ok(VersionMatch::First),
                    "all" => Ok(VersionMatch::All),
                    other => normalize_timestamp(other).map(VersionMatch::At),
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(ObjectFilter {
            added_after,
            ids: self.match_id.as_deref().map(split_list).unwrap_or_default(),
            types: self.match_type.as_deref().map(split_list).unwrap_or_default(),
            versions,
            spec_versions: self
                .match_spec_version
                .as_deref()
                .map(split_list)
                .unwrap_or_default(),
        })
    }

    /// Build the client window from `limit`/`next`, falling back to a `Range` header
    pub fn window(&self, range_header: Option<&str>) -> Result<Window, ApiContractError> {
        if self.limit.is_none() && self.next.is_none() {
            if let Some(range) = range_header {
                return parse_range_header(range);
            }
        }

        let limit = self
            .limit
            .as_deref()
            .map(|raw| match raw.trim().parse::<usize>() {
                Ok(0) | Err(_) => Err(ApiContractError::InvalidLimit(raw.to_string())),
                Ok(limit) => Ok(limit),
            })
            .transpose()?;
        let offset = self
            .next
            .as_deref()
            .map(|raw| raw.trim().parse::<usize>().map_err(|_| ApiContractError::InvalidNext(raw.to_string())))
            .transpose()?
            .unwrap_or(0);

        Ok(Window { offset, limit })
    }
}

/// Parse a `Range: items <first>-<last>` header into a window
pub fn parse_range_header(raw: &str) -> Result<Window, ApiContractError> {
    let invalid = || ApiContractError::InvalidRange(raw.to_string());
    let items = raw.trim().strip_prefix("items").ok_or_else(invalid)?;
    let items = items.trim_start_matches([' ', '=']);
    let (first, last) = items.split_once('-').ok_or_else(invalid)?;
    let first: usize = first.trim().parse().map_err(|_| invalid())?;
    let last: usize = last.trim().parse().map_err(|_| invalid())?;
    let count = last
        .checked_sub(first)
        .and_then(|span| span.checked_add(1))
        .ok_or_else(invalid)?;
    Ok(Window {
        offset: first,
        limit: Some(count),
    })
}

/// Render a timestamp the way stored `date_added` values are written
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp and re-render it in canonical millisecond form
pub fn normalize_timestamp(raw: &str) -> Result<String, ApiContractError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|at| format_timestamp(at.with_timezone(&Utc)))
        .map_err(|_| ApiContractError::InvalidTimestamp(raw.to_string()))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_selects_latest_versions() {
        let filter = ObjectQueryParams::default().filter().unwrap();
        assert_eq!(filter, ObjectFilter::default());
    }

    #[test]
    fn filter_parses_lists_and_timestamps() {
        let params = ObjectQueryParams {
            added_after: Some("2016-02-01T00:00:01+00:00".into()),
            match_type: Some("indicator, malware".into()),
            match_version: Some("first,2016-01-01T01:01:01.000Z".into()),
            ..Default::default()
        };
        let filter = params.filter().unwrap();
        assert_eq!(filter.added_after.as_deref(), Some("2016-02-01T00:00:01.000Z"));
        assert_eq!(filter.types, vec!["indicator", "malware"]);
        assert_eq!(
            filter.versions,
            vec![
                VersionMatch::First,
                VersionMatch::At("2016-01-01T01:01:01.000Z".into())
            ]
        );
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let params = ObjectQueryParams {
            added_after: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(matches!(params.filter(), Err(ApiContractError::InvalidTimestamp(_))));
    }

    #[test]
    fn window_is_capped_by_ceiling() {
        let params = ObjectQueryParams {
            limit: Some("500".into()),
            ..Default::default()
        };
        let window = params.window(None).unwrap().capped(100);
        assert_eq!(window.limit, Some(100));

        let unbounded = ObjectQueryParams::default().window(None).unwrap().capped(25);
        assert_eq!(unbounded, Window { offset: 0, limit: Some(25) });
    }

    #[test]
    fn zero_limit_is_invalid() {
        let params = ObjectQueryParams {
            limit: Some("0".into()),
            ..Default::default()
        };
        assert!(params.window(None).is_err());
    }

    #[test]
    fn range_header_sets_offset_and_count() {
        let window = ObjectQueryParams::default().window(Some("items 10-19")).unwrap();
        assert_eq!(window, Window { offset: 10, limit: Some(10) });
        assert!(parse_range_header("items 5-1").is_err());
        assert!(parse_range_header("bytes 0-10").is_err());
    }

    #[test]
    fn range_header_spanning_all_of_usize_is_rejected() {
        let raw = format!("items 0-{}", usize::MAX);
        assert!(matches!(
            parse_range_header(&raw),
            Err(ApiContractError::InvalidRange(_))
        ));
        let window = parse_range_header(&format!("items 1-{}", usize::MAX)).unwrap();
        assert_eq!(window, Window { offset: 1, limit: Some(usize::MAX) });
    }

    #[test]
    fn next_token_only_when_more_remain() {
        let window = Window { offset: 10, limit: Some(5) };
        assert_eq!(window.next_token(5, 30), Some("15".to_string()));
        assert_eq!(window.next_token(5, 15), None);
    }
}
