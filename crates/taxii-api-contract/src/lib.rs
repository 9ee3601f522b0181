// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TAXII REST contract types
//!
//! This crate defines the resource bodies, media types, query parameters and
//! the error envelope served by the TAXII server. The types are shared
//! between the configuration model (which declares discovery, API root and
//! collection resources) and the server (which renders them).

pub mod error;
pub mod media;
pub mod query;
pub mod types;

pub use error::*;
pub use media::*;
pub use query::*;
pub use types::*;
