// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TAXII resource bodies

use serde::{Deserialize, Serialize};

/// Discovery resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_roots: Vec<String>,
}

/// API Root resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRoot {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_versions")]
    pub versions: Vec<String>,
    #[serde(default = "default_max_content_length")]
    pub max_content_length: u64,
}

fn default_versions() -> Vec<String> {
    vec![crate::MEDIA_TYPE_TAXII21.to_string()]
}

fn default_max_content_length() -> u64 {
    104_857_600
}

/// Collection resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
    #[serde(default = "default_media_types")]
    pub media_types: Vec<String>,
}

fn default_media_types() -> Vec<String> {
    vec![crate::MEDIA_TYPE_STIX21.to_string()]
}

impl Collection {
    /// A collection shows up in a Collections listing only when it can be read or written
    pub fn is_listable(&self) -> bool {
        self.can_read || self.can_write
    }
}

/// Collections resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    #[serde(default)]
    pub collections: Vec<Collection>,
}

/// Envelope carrying STIX objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default)]
    pub objects: Vec<serde_json::Value>,
}

/// Manifest entry describing one object version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub id: String,
    pub date_added: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// Manifest resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default)]
    pub objects: Vec<ManifestRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_defaults_from_minimal_json() {
        let collection: Collection =
            serde_json::from_str(r#"{"id": "col-1", "title": "Indicators"}"#).unwrap();
        assert!(!collection.can_read);
        assert!(!collection.can_write);
        assert!(!collection.is_listable());
        assert_eq!(collection.media_types, vec![crate::MEDIA_TYPE_STIX21.to_string()]);
    }

    #[test]
    fn empty_collections_listing_keeps_array() {
        let json = serde_json::to_value(Collections::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "collections": [] }));
    }

    #[test]
    fn envelope_omits_next_without_more() {
        let envelope = Envelope {
            more: false,
            next: None,
            objects: vec![serde_json::json!({"id": "indicator--1"})],
        };
        let json = serde_json::to_value(envelope).unwrap();
        assert!(json.get("next").is_none());
        assert_eq!(json["more"], false);
    }
}
