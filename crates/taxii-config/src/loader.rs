// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration file loading

use crate::error::{ConfigError, ConfigResult};
use crate::model::ServerConfig;
use crate::validate::validate;
use std::path::Path;

/// Read, parse and validate the configuration file at `path`
///
/// Files ending in `.toml` are parsed as TOML, everything else as JSON.
/// TOML has no null, so tri-state fields in a TOML file can only be unset or
/// set.
pub fn load(path: &Path) -> ConfigResult<ServerConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let config = if is_toml {
        from_toml_str(&content)?
    } else {
        from_json_str(&content)?
    };

    tracing::debug!(path = %path.display(), "loaded configuration");
    tracing::trace!(?config, "configuration dump");
    Ok(config)
}

/// Parse and validate a JSON configuration document
pub fn from_json_str(content: &str) -> ConfigResult<ServerConfig> {
    let config: ServerConfig = serde_json::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Parse and validate a TOML configuration document
pub fn from_toml_str(content: &str) -> ConfigResult<ServerConfig> {
    let config: ServerConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}
