//! Gateway dependency injection
//!
//! All external collaborators of the request handler are assembled here at
//! cold start. The builder fills anything not provided with the production
//! default, so the binary stays a one-liner while tests can swap in stub
//! fetchers, canned route tables, or temp-dir configuration stores.

use std::sync::Arc;

use restmux_core::{AdapterRegistry, ServiceConfigStore};

use crate::invoke::{HttpBackendInvoker, ResourceFetcher};
use crate::routing::RouteTable;

use super::GatewayConfig;

/// Fully-resolved collaborators for a [`GatewayServer`](super::GatewayServer).
pub struct GatewayDependencies {
    pub routes: Arc<RouteTable>,
    pub registry: Arc<AdapterRegistry>,
    pub config_store: Arc<ServiceConfigStore>,
    pub fetcher: Arc<dyn ResourceFetcher>,
}

/// Builder for [`GatewayDependencies`].
#[derive(Default)]
pub struct DependenciesBuilder {
    routes: Option<RouteTable>,
    registry: Option<AdapterRegistry>,
    config_store: Option<ServiceConfigStore>,
    fetcher: Option<Arc<dyn ResourceFetcher>>,
}

impl DependenciesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = Some(routes);
        self
    }

    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_config_store(mut self, config_store: ServiceConfigStore) -> Self {
        self.config_store = Some(config_store);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Resolve the dependencies, defaulting anything unset from the
    /// environment and the gateway configuration.
    pub fn build(self, config: &GatewayConfig) -> GatewayDependencies {
        GatewayDependencies {
            routes: Arc::new(self.routes.unwrap_or_else(RouteTable::from_env)),
            registry: Arc::new(self.registry.unwrap_or_else(AdapterRegistry::with_defaults)),
            config_store: Arc::new(
                self.config_store
                    .unwrap_or_else(|| ServiceConfigStore::new(&config.specs_root)),
            ),
            fetcher: self
                .fetcher
                .unwrap_or_else(|| Arc::new(HttpBackendInvoker::new())),
        }
    }
}
