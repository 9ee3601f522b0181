// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Main server implementation

use crate::dependencies::DefaultServerDependencies;
use crate::error::StartupError;
use crate::handlers::{self, TaxiiRequest};
use crate::state::AppState;
use crate::topology::{assemble, EndpointDescriptor, EndpointRegistry, ResourceKind};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderMap, Uri},
    routing::{get, MethodRouter},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use taxii_api_contract::ObjectQueryParams;
use taxii_config::{ServerConfig, Transport};
use taxii_store::StoreHandle;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

type QueryResult = Result<Query<ObjectQueryParams>, QueryRejection>;

enum Listener {
    Http,
    Https { cert: String, key: String },
}

/// TAXII HTTP server
pub struct Server {
    addr: SocketAddr,
    listener: Listener,
    app: Router,
    store: StoreHandle,
    endpoints: usize,
}

impl Server {
    /// Create a server with the default storage backend and auth policy
    pub async fn new(config: &ServerConfig) -> Result<Self, StartupError> {
        let state = DefaultServerDependencies::new(config).await?.into_state();
        Self::with_state(config, state)
    }

    /// Construct a server from an already-built app state
    pub fn with_state(config: &ServerConfig, state: AppState) -> Result<Self, StartupError> {
        let addr = config.listen_addr()?;
        let listener = match config.transport()? {
            Transport::Http => Listener::Http,
            Transport::Https => Listener::Https {
                cert: config.prefixed(config.global.tls_crt.as_deref().unwrap_or_default()),
                key: config.prefixed(config.global.tls_key.as_deref().unwrap_or_default()),
            },
        };

        let registry = assemble(config, state.store.clone())?;
        let endpoints = registry.len();
        let store = state.store.clone();
        let app = Self::build_app(registry, state);
        Ok(Self {
            addr,
            listener,
            app,
            store,
            endpoints,
        })
    }

    /// Build the Axum application: one GET route per endpoint descriptor
    pub fn build_app(registry: EndpointRegistry, state: AppState) -> Router {
        let middleware_stack = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new());

        let mut router: Router<AppState> = Router::new();
        for endpoint in registry {
            let path = endpoint.route_path();
            info!(path = %endpoint.path, kind = %endpoint.kind(), "serving endpoint");
            router = router.route(&path, endpoint_route(Arc::new(endpoint)));
        }

        router.with_state(state).layer(middleware_stack)
    }

    /// The application router, for driving requests without a socket
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Get the bind address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run until interrupted, then release the storage backend
    pub async fn run(self) -> Result<(), StartupError> {
        let Server {
            addr,
            listener,
            app,
            store,
            endpoints,
        } = self;

        match listener {
            Listener::Http => {
                let tcp = tokio::net::TcpListener::bind(addr)
                    .await
                    .map_err(|source| StartupError::Bind { addr, source })?;
                info!(%addr, endpoints, "TAXII server listening over http");
                axum::serve(tcp, app)
                    .with_graceful_shutdown(shutdown_signal())
                    .await
                    .map_err(StartupError::Serve)?;
            }
            Listener::Https { cert, key } => {
                let tls = RustlsConfig::from_pem_file(&cert, &key)
                    .await
                    .map_err(|source| StartupError::Tls { cert, key, source })?;
                let handle = axum_server::Handle::new();
                tokio::spawn({
                    let handle = handle.clone();
                    async move {
                        shutdown_signal().await;
                        handle.graceful_shutdown(Some(Duration::from_secs(10)));
                    }
                });
                info!(%addr, endpoints, "TAXII server listening over https");
                axum_server::bind_rustls(addr, tls)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
                    .map_err(|source| StartupError::Bind { addr, source })?;
            }
        }

        info!("shutting down");
        if let Err(err) = store.close().await {
            warn!(error = %err, "failed to close storage backend");
        }
        Ok(())
    }
}

fn endpoint_route(endpoint: Arc<EndpointDescriptor>) -> MethodRouter<AppState> {
    if endpoint.kind() == ResourceKind::ObjectById {
        get(
            move |State(state): State<AppState>,
                  Path(object_id): Path<String>,
                  uri: Uri,
                  headers: HeaderMap,
                  query: QueryResult| async move {
                let mut request = request(uri, headers, query);
                request.object_id = Some(object_id);
                handlers::handle(state, &endpoint, request).await
            },
        )
    } else {
        get(
            move |State(state): State<AppState>, uri: Uri, headers: HeaderMap, query: QueryResult| async move {
                handlers::handle(state, &endpoint, request(uri, headers, query)).await
            },
        )
    }
}

fn request(uri: Uri, headers: HeaderMap, query: QueryResult) -> TaxiiRequest {
    let mut request = TaxiiRequest::new(uri.path(), headers);
    request.query = query.map(|Query(params)| params).map_err(|rejection| rejection.body_text());
    request
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
