//! Gateway Server
//!
//! HTTP server exposing the aggregation gateway. Self-contained with
//! dependency injection: the adapter registry, route table, configuration
//! store, and backend invoker are all built at cold start and passed in,
//! never hidden behind ambient statics.

mod dependencies;
mod handlers;
pub mod logging_middleware;
mod state;

pub use dependencies::{DependenciesBuilder, GatewayDependencies};
pub use state::AppState;

use axum::{middleware, routing::get, Router};
use std::env;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Default port for the gateway server.
pub const DEFAULT_GATEWAY_PORT: u16 = 9400;

/// Default deployment stage prefixed onto client-visible paths.
pub const DEFAULT_STAGE: &str = "dev";

/// Gateway server configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Deployment stage segment used in rewritten links
    pub stage: String,
    /// Root directory of per-backend service configuration
    pub specs_root: String,
    /// Enable CORS for browser access
    pub enable_cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_GATEWAY_PORT,
            stage: DEFAULT_STAGE.to_string(),
            specs_root: "./specs".to_string(),
            enable_cors: true,
        }
    }
}

impl GatewayConfig {
    /// Build configuration from `RESTMUX_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = env::var("RESTMUX_HOST") {
            config.host = host;
        }
        if let Some(port) = env::var("RESTMUX_PORT").ok().and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        if let Ok(stage) = env::var("RESTMUX_STAGE") {
            config.stage = stage;
        }
        if let Ok(specs_root) = env::var("RESTMUX_SPECS_ROOT") {
            config.specs_root = specs_root;
        }
        if let Ok(value) = env::var("RESTMUX_DISABLE_CORS") {
            config.enable_cors = !matches!(value.as_str(), "1" | "true");
        }
        config
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid address")
    }

    /// Get the base URL for this gateway
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

/// Aggregation gateway server.
///
/// All external collaborators are injected through the constructor, keeping
/// the gateway testable and environment-agnostic.
pub struct GatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Create a new gateway server with dependency injection.
    pub fn new(config: GatewayConfig, dependencies: GatewayDependencies) -> Self {
        info!(
            "[Gateway] Initializing (stage '{}', {} backend(s))",
            config.stage,
            dependencies.routes.backend_names().len()
        );

        let state = AppState {
            stage: config.stage.clone(),
            routes: dependencies.routes,
            registry: dependencies.registry,
            config_store: dependencies.config_store,
            fetcher: dependencies.fetcher,
        };

        Self { config, state }
    }

    /// Build the Axum router.
    ///
    /// Every path except the health endpoint falls through to the gateway
    /// orchestrator, which owns routing to backends.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/healthz", get(handlers::health))
            .fallback(handlers::gateway)
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(
                logging_middleware::http_logging_middleware,
            ));

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Run the gateway server.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.addr();

        info!("[Gateway] Starting on {}", addr);
        info!("[Gateway] Stage: {}", self.config.stage);
        info!(
            "[Gateway] CORS: {}",
            if self.config.enable_cors {
                "enabled"
            } else {
                "disabled"
            }
        );
        for name in self.state.routes.backend_names() {
            info!("[Gateway] Backend: {}", name);
        }

        let router = self.build_router();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("[Gateway] Ready to accept connections");
        axum::serve(listener, router).await?;

        Ok(())
    }

    /// Start the server in the background.
    ///
    /// Returns a JoinHandle that can be used to wait for completion or abort.
    pub fn spawn(self) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
