//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router serving the check tree under the route prefix
//! - Wire up middleware (auth, tracing, timeout, request ID)
//! - Serve plain TCP or TLS until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::checks::HealthChecks;
use crate::config::ServiceConfig;
use crate::http::auth::require_api_key;
use crate::http::request::{identifier_from_path, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::health_response;
use crate::http::tls::load_tls_config;
use crate::lifecycle::ShutdownListener;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub checks: HealthChecks,
}

/// HTTP server exposing a [`HealthChecks`] tree.
pub struct HealthServer {
    router: Router,
    config: ServiceConfig,
}

impl HealthServer {
    /// Create a server for `checks` with the given configuration.
    pub fn new(config: ServiceConfig, checks: HealthChecks) -> Self {
        let router = Self::build_router(&config, AppState { checks });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let prefix = config.health.route_prefix.trim_end_matches('/');
        let subtree_route = format!("{prefix}/{{*path}}");
        let root_route = if prefix.is_empty() { "/" } else { prefix };

        let mut router = Router::new()
            .route(root_route, get(root_handler))
            .route(&subtree_route, get(subtree_handler));
        if !prefix.is_empty() {
            // The catch-all does not match an empty tail.
            router = router.route(&format!("{prefix}/"), get(root_handler));
        }
        let mut router = router.with_state(state);

        if let Some(api_key) = &config.auth.api_key {
            let api_key: Arc<str> = Arc::from(api_key.as_str());
            router = router.layer(middleware::from_fn_with_state(api_key, require_api_key));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.health.request_timeout_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for embedding into a larger application.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownListener,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.config.health.route_prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS on the configured bind address.
    pub async fn run_tls(self, shutdown: ShutdownListener) -> Result<(), std::io::Error> {
        let tls = self.config.listener.tls.as_ref().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "TLS is not configured")
        })?;
        let rustls = load_tls_config(tls).await?;
        let addr: SocketAddr = self
            .config
            .listener
            .bind_address
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let handle = axum_server::Handle::new();
        let graceful = handle.clone();
        tokio::spawn(async move {
            shutdown.wait().await;
            graceful.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

async fn root_handler(State(state): State<AppState>) -> Response {
    invoke(&state, "").await
}

async fn subtree_handler(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    invoke(&state, &identifier_from_path(&path)).await
}

async fn invoke(state: &AppState, id: &str) -> Response {
    tracing::debug!(id = %id, "Health request");
    health_response(state.checks.invoke(id).await)
}
