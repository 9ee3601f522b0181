// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! HTML rendering settings and their inheritance

use crate::tristate::Tristate;
use serde::{Deserialize, Serialize};

const DEFAULT_TEMPLATE_DIR: &str = "templates/";

/// Resource kinds that have an HTML template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Discovery,
    ApiRoot,
    Collections,
    Collection,
    Objects,
    Manifest,
}

impl TemplateKind {
    fn default_file(self) -> &'static str {
        match self {
            TemplateKind::Discovery => "discoveryResource.html",
            TemplateKind::ApiRoot => "apirootResource.html",
            TemplateKind::Collections => "collectionsResource.html",
            TemplateKind::Collection => "collectionResource.html",
            TemplateKind::Objects => "objectsResource.html",
            TemplateKind::Manifest => "manifestResource.html",
        }
    }
}

/// Per resource kind template file names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HtmlTemplates {
    #[serde(skip_serializing_if = "Tristate::is_unset")]
    pub discovery: Tristate<String>,
    #[serde(skip_serializing_if = "Tristate::is_unset")]
    pub api_root: Tristate<String>,
    #[serde(skip_serializing_if = "Tristate::is_unset")]
    pub collections: Tristate<String>,
    #[serde(skip_serializing_if = "Tristate::is_unset")]
    pub collection: Tristate<String>,
    #[serde(skip_serializing_if = "Tristate::is_unset")]
    pub objects: Tristate<String>,
    #[serde(skip_serializing_if = "Tristate::is_unset")]
    pub manifest: Tristate<String>,
}

impl HtmlTemplates {
    fn get(&self, kind: TemplateKind) -> &Tristate<String> {
        match kind {
            TemplateKind::Discovery => &self.discovery,
            TemplateKind::ApiRoot => &self.api_root,
            TemplateKind::Collections => &self.collections,
            TemplateKind::Collection => &self.collection,
            TemplateKind::Objects => &self.objects,
            TemplateKind::Manifest => &self.manifest,
        }
    }

    fn inherit(&self, parent: &HtmlTemplates) -> HtmlTemplates {
        HtmlTemplates {
            discovery: self.discovery.inherit(&parent.discovery),
            api_root: self.api_root.inherit(&parent.api_root),
            collections: self.collections.inherit(&parent.collections),
            collection: self.collection.inherit(&parent.collection),
            objects: self.objects.inherit(&parent.objects),
            manifest: self.manifest.inherit(&parent.manifest),
        }
    }
}

/// HTML settings as declared at one level of the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HtmlSettings {
    #[serde(skip_serializing_if = "Tristate::is_unset")]
    pub enabled: Tristate<bool>,
    #[serde(skip_serializing_if = "Tristate::is_unset")]
    pub template_dir: Tristate<String>,
    pub templates: HtmlTemplates,
}

impl HtmlSettings {
    /// Field-wise inheritance of this (child) level from `parent`
    pub fn inherit(&self, parent: &HtmlSettings) -> HtmlSettings {
        HtmlSettings {
            enabled: self.enabled.inherit(&parent.enabled),
            template_dir: self.template_dir.inherit(&parent.template_dir),
            templates: self.templates.inherit(&parent.templates),
        }
    }

    /// Apply built-in defaults to every field that is unset or null
    pub fn resolve(&self) -> ResolvedHtml {
        ResolvedHtml {
            enabled: self.enabled.value_or(false),
            template_dir: self.template_dir.value_or(DEFAULT_TEMPLATE_DIR.to_string()),
            templates: self.templates.clone(),
        }
    }
}

/// HTML settings with every inherited value decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHtml {
    pub enabled: bool,
    pub template_dir: String,
    templates: HtmlTemplates,
}

impl ResolvedHtml {
    /// Template file name for `kind`
    pub fn template_file(&self, kind: TemplateKind) -> String {
        self.templates.get(kind).value_or(kind.default_file().to_string())
    }

    /// Full template path by strict concatenation of prefix, directory and file
    pub fn template_path(&self, prefix: &str, kind: TemplateKind) -> String {
        format!("{}{}{}", prefix, self.template_dir, self.template_file(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> HtmlSettings {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn unset_child_takes_global_settings() {
        let global = parse(r#"{"enabled": true, "template_dir": "html/"}"#);
        let child = HtmlSettings::default();
        let resolved = child.inherit(&global).resolve();
        assert!(resolved.enabled);
        assert_eq!(resolved.template_dir, "html/");
    }

    #[test]
    fn explicit_child_overrides_global() {
        let global = parse(r#"{"enabled": true, "templates": {"objects": "global.html"}}"#);
        let child = parse(r#"{"enabled": false, "templates": {"objects": "root.html"}}"#);
        let resolved = child.inherit(&global).resolve();
        assert!(!resolved.enabled);
        assert_eq!(resolved.template_file(TemplateKind::Objects), "root.html");
    }

    #[test]
    fn null_child_resets_to_default() {
        let global = parse(r#"{"enabled": true, "templates": {"manifest": "m.html"}}"#);
        let child = parse(r#"{"enabled": null, "templates": {"manifest": null}}"#);
        let resolved = child.inherit(&global).resolve();
        assert!(!resolved.enabled);
        assert_eq!(
            resolved.template_file(TemplateKind::Manifest),
            "manifestResource.html"
        );
    }

    #[test]
    fn template_path_is_concatenated() {
        let resolved = parse(r#"{"template_dir": "templates/"}"#).resolve();
        assert_eq!(
            resolved.template_path("/opt/taxii/", TemplateKind::Collections),
            "/opt/taxii/templates/collectionsResource.html"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<HtmlSettings>(r#"{"enable": true}"#).is_err());
    }
}
