//! Pluggable format adapters
//!
//! An adapter reshapes one backend's traffic: converting a legacy response
//! format to canonical JSON and/or synthesizing hypermedia links the backend
//! cannot express itself. Adapters are stateless strategy objects registered
//! once at startup; the same instance serves concurrent requests.
//!
//! Capabilities are declared with explicit flags. The pipeline dispatches on
//! those flags and never calls an undeclared method.

mod simple_xml;

pub use simple_xml::{SimpleXmlResponseAdapter, SIMPLE_XML_RESPONSE};

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::domain::service_config::ServiceConfig;
use crate::error::GatewayResult;
use crate::media;

/// A transformed backend response: canonical JSON plus its media type.
#[derive(Debug)]
pub struct TransformedResponse {
    pub body: Value,
    pub content_type: &'static str,
}

/// A named, stateless response/link transformer.
pub trait Adapter: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this adapter reshapes client→backend request bodies.
    fn transforms_requests(&self) -> bool {
        false
    }

    /// Whether this adapter reshapes backend→client response bodies.
    fn transforms_responses(&self) -> bool {
        false
    }

    /// Whether this adapter synthesizes `_links` from service configuration.
    fn injects_links(&self) -> bool {
        false
    }

    /// Reshape an outbound request body. Only invoked when
    /// [`transforms_requests`](Adapter::transforms_requests) is true.
    fn transform_request(&self, body: Vec<u8>) -> GatewayResult<Vec<u8>> {
        Ok(body)
    }

    /// Convert a backend response body to canonical JSON. Only invoked when
    /// [`transforms_responses`](Adapter::transforms_responses) is true.
    fn transform_response(&self, body: &[u8], content_type: &str)
        -> GatewayResult<TransformedResponse>;

    /// Synthesize `_links` on a resource (or on each item of a collection)
    /// from configured relationships. Only invoked when
    /// [`injects_links`](Adapter::injects_links) is true.
    fn inject_links(
        &self,
        resource: &mut Value,
        config: &ServiceConfig,
        stage: &str,
        api_name: &str,
        resource_name: &str,
    ) {
        let _ = (resource, config, stage, api_name, resource_name);
    }
}

/// Ephemeral per-request adapter selection.
///
/// Derived by combining the request path with the backend's service
/// configuration; has no identity beyond a single request.
#[derive(Clone)]
pub struct AdapterContext {
    pub api_name: String,
    pub adapter: Option<Arc<dyn Adapter>>,
    pub config: Option<Arc<ServiceConfig>>,
}

impl AdapterContext {
    /// A context with no adapter: plain JSON pass-through handling.
    pub fn passthrough(api_name: &str) -> Self {
        Self {
            api_name: api_name.to_string(),
            adapter: None,
            config: None,
        }
    }

    /// Resolve the context for an API from its configuration and the registry.
    ///
    /// A configured adapter name that is not registered degrades to
    /// pass-through handling with a warning; it never fails the request.
    pub fn from_config(
        api_name: &str,
        config: Option<Arc<ServiceConfig>>,
        registry: &AdapterRegistry,
    ) -> Self {
        let adapter = config
            .as_ref()
            .and_then(|c| c.primary_adapter())
            .and_then(|name| {
                let adapter = registry.get(name);
                if adapter.is_none() {
                    warn!(
                        "[AdapterRegistry] Adapter '{}' configured for '{}' is not registered",
                        name, api_name
                    );
                }
                adapter
            });

        Self {
            api_name: api_name.to_string(),
            adapter,
            config,
        }
    }

    pub fn uses_adapter(&self) -> bool {
        self.adapter.is_some()
    }
}

/// Name→implementation lookup for adapters.
///
/// Built once at process start and injected into the request handler;
/// immutable afterwards, so lookups are safe under concurrent requests.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the stock adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SimpleXmlResponseAdapter::new()));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Adapter>> {
        self.adapters.get(name).cloned()
    }

    pub fn list(&self) -> Vec<Arc<dyn Adapter>> {
        self.adapters.values().cloned().collect()
    }
}

/// Whether a backend `Content-Type` requires format conversion.
pub fn requires_conversion(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("xml")
}

/// Media type adapters convert into.
pub const CANONICAL_CONTENT_TYPE: &str = media::JSON;
