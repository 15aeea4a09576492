//! Resource envelope accessors
//!
//! Backend payloads are opaque JSON and must survive the gateway unmodified
//! except for deliberate transformation, so resources stay `serde_json::Value`
//! end to end. This module provides the reserved-key vocabulary and typed
//! accessors over that shape instead of a lossy struct mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved key holding the hypermedia link map.
pub const LINKS: &str = "_links";

/// Reserved key holding embedded related resources, keyed by relationship name.
pub const INCLUDED: &str = "_included";

/// Reserved key marking a resource as a collection.
pub const ITEMS: &str = "items";

/// Relationship name of a resource's own canonical link.
pub const SELF_LINK: &str = "self";

/// A single hypermedia link.
///
/// Backends emit either a bare URL string or an object carrying link
/// metadata. Both forms round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Link {
    Href(String),
    Object {
        href: String,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        link_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

impl Link {
    /// Build a link object from relationship metadata.
    pub fn with_metadata(href: String, link_type: &str, title: &str) -> Self {
        Link::Object {
            href,
            link_type: Some(link_type.to_string()),
            title: Some(title.to_string()),
        }
    }

    pub fn href(&self) -> &str {
        match self {
            Link::Href(href) => href,
            Link::Object { href, .. } => href,
        }
    }
}

impl From<Link> for Value {
    fn from(link: Link) -> Self {
        serde_json::to_value(&link).expect("links serialize to plain JSON")
    }
}

/// Get the `_links` map of a resource, if present.
pub fn links(resource: &Value) -> Option<&Map<String, Value>> {
    resource.get(LINKS).and_then(Value::as_object)
}

/// Extract the href of a named relationship from `_links`.
///
/// Handles both the bare-string and `{href, ...}` object forms.
pub fn link_href(resource: &Value, relationship: &str) -> Option<String> {
    let link = links(resource)?.get(relationship)?;
    match link {
        Value::String(href) => Some(href.clone()),
        Value::Object(obj) => obj
            .get("href")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => None,
    }
}

/// A resource with an `items` array is a collection.
pub fn is_collection(resource: &Value) -> bool {
    resource.get(ITEMS).map(Value::is_array).unwrap_or(false)
}

pub fn items(resource: &Value) -> Option<&Vec<Value>> {
    resource.get(ITEMS).and_then(Value::as_array)
}

pub fn items_mut(resource: &mut Value) -> Option<&mut Vec<Value>> {
    resource.get_mut(ITEMS).and_then(Value::as_array_mut)
}

/// The resource's `id`, normalized to a string.
///
/// Numeric ids are common in legacy backends; they compare equal to their
/// decimal rendering for de-duplication purposes.
pub fn resource_id(resource: &Value) -> Option<String> {
    match resource.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
