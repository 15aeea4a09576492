//! Restmux Gateway
//!
//! Aggregation gateway that fronts independent REST backends with:
//! - Prefix-based request routing to configured backends
//! - Content-negotiated response modes (pass-through, simple-rest, aggregated)
//! - A pluggable adapter pipeline (XML→JSON conversion, link injection)
//! - Gateway-relative, stage-prefixed hypermedia link rewriting
//! - `include` aggregation: parallel fan-out to related resources across backends

pub mod include;
pub mod invoke;
pub mod negotiate;
pub mod pipeline;
pub mod routing;
pub mod server;

pub use include::IncludeResolver;
pub use invoke::{BackendResponse, HttpBackendInvoker, ResourceFetcher, FORWARDED_HEADERS};
pub use negotiate::ResponseMode;
pub use pipeline::AdapterPipeline;
pub use routing::{extract_api_name, RouteTable, RoutedBackend};
pub use server::{
    DependenciesBuilder, GatewayConfig, GatewayDependencies, GatewayServer,
};
