// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::error::{ConfigError, ConfigResult};
use crate::model::{BackendKind, ServerConfig, Transport};
use crate::tristate::Tristate;
use std::collections::HashSet;

/// Reject configurations that cannot be served
pub(crate) fn validate(config: &ServerConfig) -> ConfigResult<()> {
    validate_global(config)?;

    let mut seen = HashSet::new();
    for collection in &config.collection_resources {
        if !seen.insert(collection.id.as_str()) {
            return Err(ConfigError::DuplicateCollection(collection.id.clone()));
        }
        if collection.id.is_empty() || collection.id.contains('/') {
            return Err(ConfigError::InvalidPath {
                path: collection.id.clone(),
                reason: "collection ids must be non-empty and must not contain '/'",
            });
        }
        literal(&collection.id)?;
    }

    if let Some(discovery) = &config.discovery {
        service_path(&discovery.path)?;
        if !config.discovery_resources.contains_key(&discovery.resource_id) {
            return Err(ConfigError::UnknownDiscoveryResource(discovery.resource_id.clone()));
        }
    }

    for api_root in &config.api_root_server.services {
        service_path(&api_root.path)?;
        segment_path(&api_root.collections.path)?;

        if !config.api_root_resources.contains_key(&api_root.resource_id) {
            return Err(ConfigError::UnknownApiRootResource {
                api_root: api_root.path.clone(),
                resource_id: api_root.resource_id.clone(),
            });
        }

        if let Tristate::Value(0) = api_root.max_range {
            return Err(ConfigError::InvalidMaxRange(api_root.path.clone()));
        }

        for collection_id in &api_root.collections.resource_ids {
            if config.collection(collection_id).is_none() {
                return Err(ConfigError::UnknownCollection {
                    api_root: api_root.path.clone(),
                    collection_id: collection_id.clone(),
                });
            }
        }
    }

    Ok(())
}

fn validate_global(config: &ServerConfig) -> ConfigResult<()> {
    let backend = config.backend()?;
    if backend == BackendKind::Sqlite && config.global.db_file.is_none() {
        return Err(ConfigError::MissingDbFile(backend.to_string()));
    }

    if config.transport()? == Transport::Https
        && (config.global.tls_crt.is_none() || config.global.tls_key.is_none())
    {
        return Err(ConfigError::MissingTlsFiles);
    }

    config.listen_addr()?;

    if config.global.max_range == 0 {
        return Err(ConfigError::InvalidMaxRange("global".to_string()));
    }

    Ok(())
}

fn service_path(path: &str) -> ConfigResult<()> {
    if !path.starts_with('/') || !path.ends_with('/') {
        return Err(ConfigError::InvalidPath {
            path: path.to_string(),
            reason: "service paths must start and end with '/'",
        });
    }
    literal(path)
}

fn segment_path(path: &str) -> ConfigResult<()> {
    if path.starts_with('/') || !path.ends_with('/') || path.len() < 2 {
        return Err(ConfigError::InvalidPath {
            path: path.to_string(),
            reason: "path segments must not start with '/' and must end with '/'",
        });
    }
    literal(path)
}

/// Route parameters and wildcards are spelled with ':' and '*'
fn literal(path: &str) -> ConfigResult<()> {
    if path.contains([':', '*']) {
        return Err(ConfigError::InvalidPath {
            path: path.to_string(),
            reason: "paths and collection ids must not contain ':' or '*'",
        });
    }
    Ok(())
}
