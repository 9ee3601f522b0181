// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TAXII 2.1 read-only server
//!
//! The configuration is turned into an immutable endpoint registry by
//! [`topology::assemble`]; every registered endpoint is then served by the
//! shared request pipeline in [`handlers`]. Unknown paths never reach the
//! pipeline and get the router's plain 404.

pub mod auth;
pub mod dependencies;
pub mod error;
pub mod handlers;
pub mod negotiate;
pub mod render;
pub mod server;
pub mod state;
pub mod topology;

pub use error::{ServerError, ServerResult, StartupError};
pub use server::Server;
pub use state::AppState;
pub use topology::{assemble, EndpointDescriptor, EndpointRegistry, Resource, ResourceKind};
