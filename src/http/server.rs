//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Resolve middleware state from config once, at startup
//! - Merge the health route with application routes
//! - Wire up the layer stack in a fixed order
//! - Serve with graceful shutdown
//!
//! # Layer Order
//! ```text
//! outermost  trace
//!            timeout
//!            correlation id
//!            client ip
//!            security headers
//!            version header
//!            error handler
//!            token blacklist   (when enabled)
//!            read only gate    (when enabled)
//!            DataTables options extension
//! innermost  body limit
//! ```
//! Headers applied outside the error handler also reach error responses.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::header::InvalidHeaderName,
    middleware::{from_fn, from_fn_with_state},
    Extension, Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::cache::DistributedCache;
use crate::config::AppConfig;
use crate::datatables::DataTablesOptions;
use crate::http::forwarded::client_ip_middleware;
use crate::http::health::health_routes;
use crate::http::middleware::{
    correlation_id_middleware, error_handler_middleware, read_only_middleware,
    security_headers::PolicyError, security_headers_middleware, token_blacklist_middleware,
    version::VersionError, ApiVersion, CodeMap, CorrelationState, ErrorHandlerState, EtagOptions,
    SecurityHeadersPolicy, TokenBlacklistState,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid correlation header: {0}")]
    CorrelationHeader(#[from] InvalidHeaderName),

    #[error("invalid security headers: {0}")]
    SecurityHeaders(#[from] PolicyError),

    #[error("invalid version header: {0}")]
    Version(#[from] VersionError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server hosting the middleware pipeline.
pub struct HttpServer {
    config: AppConfig,
    cache: Arc<dyn DistributedCache>,
    routes: Router,
    correlation: Arc<CorrelationState>,
    security_headers: Arc<SecurityHeadersPolicy>,
    version: ApiVersion,
    error_handler: ErrorHandlerState,
    datatables: DataTablesOptions,
    etag: Arc<EtagOptions>,
}

impl HttpServer {
    /// Create a server, validating every header name and value in `config`.
    pub fn new(config: AppConfig, cache: Arc<dyn DistributedCache>) -> Result<Self, ServerError> {
        let correlation = Arc::new(CorrelationState::from_config(&config.correlation)?);
        let security_headers = Arc::new(SecurityHeadersPolicy::from_config(&config.security_headers)?);
        let version = ApiVersion::from_config(&config.version)?;

        Ok(Self {
            routes: health_routes(&config.health.path),
            error_handler: ErrorHandlerState::from_config(&config.error_handling),
            datatables: DataTablesOptions::from(&config.datatables),
            etag: Arc::new(EtagOptions::from_config(&config.etag)),
            correlation,
            security_headers,
            version,
            cache,
            config,
        })
    }

    /// Map domain error codes to HTTP statuses in the error handler.
    pub fn with_code_map(mut self, code_map: impl CodeMap + 'static) -> Self {
        self.error_handler = self.error_handler.with_code_map(code_map);
        self
    }

    /// Advertise the host service's version unless config pins one.
    pub fn with_host_version(mut self, version: &str) -> Result<Self, ServerError> {
        self.version = ApiVersion::with_fallback(&self.config.version, version)?;
        Ok(self)
    }

    pub fn with_datatables_options(mut self, options: DataTablesOptions) -> Self {
        self.datatables = options;
        self
    }

    /// Merge application routes under the pipeline.
    pub fn with_routes(mut self, routes: Router) -> Self {
        self.routes = self.routes.merge(routes);
        self
    }

    /// Options for attaching [`etag_middleware`](crate::http::middleware::etag_middleware)
    /// with `route_layer`.
    pub fn etag_options(&self) -> Arc<EtagOptions> {
        Arc::clone(&self.etag)
    }

    pub fn cache(&self) -> Arc<dyn DistributedCache> {
        Arc::clone(&self.cache)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build the router with all middleware layers.
    #[allow(deprecated)]
    pub fn into_router(self) -> Router {
        let mut router = self
            .routes
            .layer(RequestBodyLimitLayer::new(self.config.listener.max_body_bytes))
            .layer(Extension(self.datatables));

        if self.config.read_only.enabled {
            tracing::warn!("Read only mode enabled, writes will be rejected");
            router = router.layer(from_fn(read_only_middleware));
        }
        if self.config.token_blacklist.enabled {
            let state = Arc::new(TokenBlacklistState::new(self.cache, &self.config.token_blacklist));
            router = router.layer(from_fn_with_state(state, token_blacklist_middleware));
        }

        router
            .layer(from_fn_with_state(Arc::new(self.error_handler), error_handler_middleware))
            .layer(self.version.layer())
            .layer(from_fn_with_state(self.security_headers, security_headers_middleware))
            .layer(from_fn_with_state(
                self.config.listener.trust_forwarded_for,
                client_ip_middleware,
            ))
            .layer(from_fn_with_state(self.correlation, correlation_id_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), ServerError> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            read_only = self.config.read_only.enabled,
            token_blacklist = self.config.token_blacklist.enabled,
            "HTTP server starting"
        );

        let app = self.into_router().into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
