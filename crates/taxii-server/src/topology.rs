// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Endpoint topology assembled from the configuration
//!
//! [`assemble`] walks the configuration once (discovery, then API roots in
//! declared order, then their collections) and produces a flat, immutable
//! [`EndpointRegistry`]. Disabled branches produce nothing. Path collisions,
//! paths the router would read as parameters and an empty result are fatal.

use std::collections::HashMap;
use std::fmt;
use taxii_api_contract::{ApiRoot, Collections, Discovery};
use taxii_config::{ApiRootService, HtmlSettings, ServerConfig, TemplateKind};
use taxii_store::StoreHandle;
use tracing::{debug, info};

/// Path parameter naming the object of an Object-by-ID endpoint
pub const OBJECT_ID_PARAM: &str = "objectid";

/// Resource kind served by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Discovery,
    ApiRoot,
    Collections,
    Collection,
    Objects,
    ObjectById,
    Manifest,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Discovery => "discovery",
            ResourceKind::ApiRoot => "api-root",
            ResourceKind::Collections => "collections",
            ResourceKind::Collection => "collection",
            ResourceKind::Objects => "objects",
            ResourceKind::ObjectById => "object",
            ResourceKind::Manifest => "manifest",
        }
    }

    /// HTML template used to render this kind
    pub fn template_kind(self) -> TemplateKind {
        match self {
            ResourceKind::Discovery => TemplateKind::Discovery,
            ResourceKind::ApiRoot => TemplateKind::ApiRoot,
            ResourceKind::Collections => TemplateKind::Collections,
            ResourceKind::Collection => TemplateKind::Collection,
            ResourceKind::Objects | ResourceKind::ObjectById => TemplateKind::Objects,
            ResourceKind::Manifest => TemplateKind::Manifest,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an endpoint serves, with the data bound at assembly time
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Discovery(Discovery),
    ApiRoot(ApiRoot),
    /// Only the visible collections of the API root
    Collections(Collections),
    Collection { collection_id: String },
    Objects { collection_id: String },
    ObjectById { collection_id: String },
    Manifest { collection_id: String },
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Discovery(_) => ResourceKind::Discovery,
            Resource::ApiRoot(_) => ResourceKind::ApiRoot,
            Resource::Collections(_) => ResourceKind::Collections,
            Resource::Collection { .. } => ResourceKind::Collection,
            Resource::Objects { .. } => ResourceKind::Objects,
            Resource::ObjectById { .. } => ResourceKind::ObjectById,
            Resource::Manifest { .. } => ResourceKind::Manifest,
        }
    }

    pub fn collection_id(&self) -> Option<&str> {
        match self {
            Resource::Collection { collection_id }
            | Resource::Objects { collection_id }
            | Resource::ObjectById { collection_id }
            | Resource::Manifest { collection_id } => Some(collection_id),
            Resource::Discovery(_) | Resource::ApiRoot(_) | Resource::Collections(_) => None,
        }
    }
}

/// HTML rendering settings resolved for one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlBinding {
    pub enabled: bool,
    /// Full template path: prefix, template directory and file name
    pub template: String,
}

/// One routable endpoint
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    /// URL path; Object-by-ID paths contain the `{objectid}` placeholder
    pub path: String,
    pub resource: Resource,
    pub html: HtmlBinding,
    /// Most items a single Objects, Object-by-ID or Manifest response may carry
    pub range_max: usize,
    pub store: StoreHandle,
}

impl EndpointDescriptor {
    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }

    /// Path in router syntax
    pub fn route_path(&self) -> String {
        self.path
            .replace(&format!("{{{}}}", OBJECT_ID_PARAM), &format!(":{}", OBJECT_ID_PARAM))
    }
}

/// Immutable set of endpoints, in assembly order
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointDescriptor>,
}

impl EndpointRegistry {
    pub fn iter(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|endpoint| endpoint.path == path)
    }
}

impl IntoIterator for EndpointRegistry {
    type Item = EndpointDescriptor;
    type IntoIter = std::vec::IntoIter<EndpointDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.into_iter()
    }
}

/// Reasons assembly produces no registry
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("endpoint path {path} is claimed by both a {first} and a {second} endpoint")]
    PathCollision {
        path: String,
        first: ResourceKind,
        second: ResourceKind,
    },

    #[error("{kind} endpoint {path} references unknown resource {resource_id}")]
    MissingResource {
        path: String,
        kind: ResourceKind,
        resource_id: String,
    },

    #[error("{kind} endpoint path {path} contains router syntax (':' or '*')")]
    RouteSyntax { path: String, kind: ResourceKind },

    #[error("configuration enables no endpoints")]
    Empty,
}

struct Assembler<'a> {
    config: &'a ServerConfig,
    store: StoreHandle,
    endpoints: Vec<EndpointDescriptor>,
    claimed: HashMap<String, ResourceKind>,
}

impl<'a> Assembler<'a> {
    fn emit(
        &mut self,
        path: String,
        resource: Resource,
        html: &HtmlSettings,
        range_max: usize,
    ) -> Result<(), AssemblyError> {
        let kind = resource.kind();
        if path.contains([':', '*']) {
            return Err(AssemblyError::RouteSyntax { path, kind });
        }
        if let Some(first) = self.claimed.get(&path) {
            return Err(AssemblyError::PathCollision {
                path,
                first: *first,
                second: kind,
            });
        }

        let resolved = html.resolve();
        let html = HtmlBinding {
            enabled: resolved.enabled,
            template: resolved.template_path(&self.config.global.prefix, kind.template_kind()),
        };

        debug!(%path, %kind, html = html.enabled, "assembled endpoint");
        self.claimed.insert(path.clone(), kind);
        self.endpoints.push(EndpointDescriptor {
            path,
            resource,
            html,
            range_max,
            store: self.store.clone(),
        });
        Ok(())
    }

    fn discovery(&mut self) -> Result<(), AssemblyError> {
        let config = self.config;
        let Some(service) = config.discovery.as_ref().filter(|service| service.enabled) else {
            return Ok(());
        };
        let discovery = config
            .discovery_resources
            .get(&service.resource_id)
            .cloned()
            .ok_or_else(|| AssemblyError::MissingResource {
                path: service.path.clone(),
                kind: ResourceKind::Discovery,
                resource_id: service.resource_id.clone(),
            })?;

        let html = service.html.inherit(&config.html);
        self.emit(
            service.path.clone(),
            Resource::Discovery(discovery),
            &html,
            config.global.max_range,
        )
    }

    fn api_root(&mut self, root: &ApiRootService) -> Result<(), AssemblyError> {
        let config = self.config;
        let api_root = config
            .api_root_resources
            .get(&root.resource_id)
            .cloned()
            .ok_or_else(|| AssemblyError::MissingResource {
                path: root.path.clone(),
                kind: ResourceKind::ApiRoot,
                resource_id: root.resource_id.clone(),
            })?;

        let html = root.html.inherit(&config.html);
        let range_max = root.max_range(&config.global);
        self.emit(root.path.clone(), Resource::ApiRoot(api_root), &html, range_max)?;

        if !root.collections.enabled {
            return Ok(());
        }

        let collections_path = root.collections_path();
        let mut visible = Collections::default();
        for collection_id in &root.collections.resource_ids {
            let collection = config.collection(collection_id).ok_or_else(|| {
                AssemblyError::MissingResource {
                    path: collections_path.clone(),
                    kind: ResourceKind::Collections,
                    resource_id: collection_id.clone(),
                }
            })?;
            if collection.is_listable() {
                visible.collections.push(collection.clone());
            }
        }
        self.emit(
            collections_path.clone(),
            Resource::Collections(visible),
            &html,
            range_max,
        )?;

        // Every configured collection is routable, listed or not.
        for collection_id in &root.collections.resource_ids {
            let base = format!("{}{}/", collections_path, collection_id);
            let id = || collection_id.clone();
            self.emit(
                base.clone(),
                Resource::Collection { collection_id: id() },
                &html,
                range_max,
            )?;
            self.emit(
                format!("{}objects/", base),
                Resource::Objects { collection_id: id() },
                &html,
                range_max,
            )?;
            self.emit(
                format!("{}objects/{{{}}}/", base, OBJECT_ID_PARAM),
                Resource::ObjectById { collection_id: id() },
                &html,
                range_max,
            )?;
            self.emit(
                format!("{}manifest/", base),
                Resource::Manifest { collection_id: id() },
                &html,
                range_max,
            )?;
        }
        Ok(())
    }
}

/// Build the endpoint registry for `config`, binding every endpoint to `store`
pub fn assemble(config: &ServerConfig, store: StoreHandle) -> Result<EndpointRegistry, AssemblyError> {
    let mut assembler = Assembler {
        config,
        store,
        endpoints: Vec::new(),
        claimed: HashMap::new(),
    };

    assembler.discovery()?;
    if config.api_root_server.enabled {
        for root in config.api_root_server.services.iter().filter(|root| root.enabled) {
            assembler.api_root(root)?;
        }
    }

    if assembler.endpoints.is_empty() {
        return Err(AssemblyError::Empty);
    }

    info!(endpoints = assembler.endpoints.len(), "endpoint topology assembled");
    Ok(EndpointRegistry {
        endpoints: assembler.endpoints,
    })
}
