// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Deployment configuration for the TAXII server.
//!
//! The configuration is read once at process start, validated, and treated as
//! immutable afterwards. Settings that may be inherited between the global
//! level and an API root or discovery service are modelled with [`Tristate`]
//! so that "absent", "explicitly null" and "explicitly set" stay distinct.

pub mod error;
pub mod html;
pub mod loader;
pub mod model;
pub mod tristate;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use html::{HtmlSettings, HtmlTemplates, ResolvedHtml, TemplateKind};
pub use loader::{from_json_str, from_toml_str, load};
pub use model::*;
pub use tristate::Tristate;
