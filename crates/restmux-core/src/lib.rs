//! # Restmux Core Library
//!
//! Domain logic for the Restmux aggregation gateway.
//!
//! ## Modules
//!
//! - `domain` - Resource envelope and per-backend service configuration
//! - `adapter` - Pluggable response/link transformers and their registry
//! - `service` - Configuration store and link rewriter
//! - `media` - Canonical media type constants
//! - `error` - Gateway error taxonomy

pub mod adapter;
pub mod domain;
pub mod error;
pub mod media;
pub mod service;

// Re-export commonly used types
pub use adapter::{
    Adapter, AdapterContext, AdapterRegistry, SimpleXmlResponseAdapter, TransformedResponse,
    SIMPLE_XML_RESPONSE,
};
pub use domain::resource;
pub use domain::resource::Link;
pub use domain::service_config::{RelationshipConfig, ServiceConfig};
pub use error::{GatewayError, GatewayResult};
pub use service::config_store::ServiceConfigStore;
pub use service::link_rewriter::{strip_stage_segment, LinkRewriter};
