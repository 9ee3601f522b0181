// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Authentication gate

use crate::error::{ServerError, ServerResult};
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use taxii_config::AuthSettings;

/// Decides whether a request may proceed
///
/// The request handlers only ask for a yes or no; policy lives behind this trait.
pub trait AuthGate: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> ServerResult<()>;
}

/// Gate that admits every request
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthGate for AllowAll {
    fn authenticate(&self, _headers: &HeaderMap) -> ServerResult<()> {
        Ok(())
    }
}

/// Static API key and/or HMAC JWT authentication
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key.as_ref().map(taxii_logging::redact))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(taxii_logging::redact))
            .finish()
    }
}

impl AuthConfig {
    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            jwt_secret: settings.jwt_secret.clone(),
        }
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            jwt_secret: None,
        }
    }

    pub fn with_jwt_secret(secret: impl Into<String>) -> Self {
        Self {
            api_key: None,
            jwt_secret: Some(secret.into()),
        }
    }

    pub fn requires_auth(&self) -> bool {
        self.api_key.is_some() || self.jwt_secret.is_some()
    }

    pub fn validate_api_key(&self, provided_key: &str) -> ServerResult<()> {
        match &self.api_key {
            Some(expected) if expected == provided_key => Ok(()),
            Some(_) => Err(ServerError::Unauthenticated("invalid API key".into())),
            None => Err(ServerError::Unauthenticated(
                "API key authentication not configured".into(),
            )),
        }
    }

    pub fn validate_jwt(&self, token: &str) -> ServerResult<Claims> {
        let secret = self.jwt_secret.as_ref().ok_or_else(|| {
            ServerError::Unauthenticated("JWT authentication not configured".into())
        })?;
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        decode::<Claims>(token, &decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| ServerError::Unauthenticated(format!("invalid JWT: {}", err)))
    }
}

impl AuthGate for AuthConfig {
    fn authenticate(&self, headers: &HeaderMap) -> ServerResult<()> {
        if !self.requires_auth() {
            return Ok(());
        }

        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        match authorization {
            Some(auth) if auth.starts_with("ApiKey ") => {
                self.validate_api_key(auth.trim_start_matches("ApiKey "))
            }
            Some(auth) if auth.starts_with("Bearer ") => {
                self.validate_jwt(auth.trim_start_matches("Bearer ")).map(|claims| {
                    tracing::debug!(sub = %claims.sub, "authenticated bearer token");
                })
            }
            _ => Err(ServerError::Unauthenticated(
                "missing or invalid authorization header".into(),
            )),
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}
