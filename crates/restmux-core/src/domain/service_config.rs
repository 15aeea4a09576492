//! Per-backend service configuration
//!
//! Each fronted backend may ship a `service.yaml` declaring which adapters
//! the gateway must run for it and how to synthesize hypermedia links the
//! backend cannot express itself. A backend with no file has an implicit
//! empty configuration; that is a valid state, not an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declaration of gateway behavior for one backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Ordered adapter names to apply to this backend's traffic.
    pub adapters: Vec<String>,

    /// Relationship links to synthesize, keyed by relationship name.
    pub relationships: BTreeMap<String, RelationshipConfig>,
}

impl ServiceConfig {
    /// The adapter responsible for this backend, when one is declared.
    pub fn primary_adapter(&self) -> Option<&str> {
        self.adapters.first().map(String::as_str)
    }
}

/// How to build one hypermedia link from fields already present on a resource.
///
/// The synthesized href is gateway-relative:
/// `/{stage}/{targetApi}/{targetResource}/{sourceField value}` by default, or
/// `/{stage}/{targetApi}{urlPattern}` when `urlPattern` is set. `{field}`
/// placeholders in the pattern are substituted (URL-encoded) from the
/// resource's own field values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipConfig {
    /// Backend that owns the target resource.
    pub target_api: String,

    /// Resource collection under the target backend.
    pub target_resource: String,

    /// Field on the source resource whose value identifies the target.
    pub source_field: String,

    /// Path-and-query template appended after `/{stage}/{targetApi}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,

    /// Link `type` metadata, copied verbatim into the link object.
    pub link_type: String,

    /// Link `title` metadata, copied verbatim into the link object.
    pub link_title: String,
}
