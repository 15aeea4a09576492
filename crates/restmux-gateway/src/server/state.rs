//! Gateway request-handling state
//!
//! Everything here is read-only during request handling: the route table
//! and adapter registry are immutable after cold start, and the
//! configuration store is read-mostly with its own interior locking.

use std::sync::Arc;

use restmux_core::{AdapterRegistry, ServiceConfigStore};

use crate::invoke::ResourceFetcher;
use crate::routing::RouteTable;

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Deployment stage segment for link rewriting.
    pub stage: String,
    /// Backend route table.
    pub routes: Arc<RouteTable>,
    /// Adapter registry, built once at startup.
    pub registry: Arc<AdapterRegistry>,
    /// Per-backend service configuration.
    pub config_store: Arc<ServiceConfigStore>,
    /// Outbound HTTP invoker.
    pub fetcher: Arc<dyn ResourceFetcher>,
}
