//! `simple-xml-response` adapter
//!
//! Fronts legacy XML backends: converts their response bodies to canonical
//! JSON and synthesizes the hypermedia links XML cannot carry, using the
//! relationship metadata from the backend's service configuration.
//!
//! Conversion rules:
//! - the root element's content becomes the resource object (root name dropped)
//! - repeated sibling elements fold into an array
//! - a root wrapping a single repeated element (`<payments><payment>...`)
//!   becomes a collection: `{"items": [...]}`
//! - text-only elements parse to number/bool when the rendering round-trips,
//!   otherwise stay strings (leading-zero ids survive)
//! - attributes merge into the element object as string fields

use lazy_static::lazy_static;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::domain::resource;
use crate::domain::service_config::{RelationshipConfig, ServiceConfig};
use crate::error::{GatewayError, GatewayResult};

use super::{Adapter, TransformedResponse, CANONICAL_CONTENT_TYPE};

/// Registered name of this adapter, referenced from `service.yaml`.
pub const SIMPLE_XML_RESPONSE: &str = "simple-xml-response";

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

/// Response adapter for XML backends. Stateless; one instance serves all
/// concurrent requests.
#[derive(Debug, Default)]
pub struct SimpleXmlResponseAdapter;

impl SimpleXmlResponseAdapter {
    pub fn new() -> Self {
        Self
    }

    fn inject_resource_links(
        &self,
        res: &mut Value,
        config: &ServiceConfig,
        stage: &str,
        api_name: &str,
        resource_name: &str,
    ) {
        let mut links = Map::new();

        for (name, rel) in &config.relationships {
            match build_relationship_href(res, rel, stage) {
                Some(href) => {
                    links.insert(
                        name.clone(),
                        resource::Link::with_metadata(href, &rel.link_type, &rel.link_title)
                            .into(),
                    );
                }
                None => {
                    warn!(
                        "[SimpleXml] Cannot build link '{}': field '{}' missing on resource",
                        name, rel.source_field
                    );
                }
            }
        }

        let self_href = match resource::resource_id(res) {
            Some(id) => format!(
                "/{}/{}/{}/{}",
                stage,
                api_name,
                resource_name,
                urlencoding::encode(&id)
            ),
            None => format!("/{}/{}/{}", stage, api_name, resource_name),
        };
        links.insert(resource::SELF_LINK.to_string(), Value::String(self_href));

        if let Some(obj) = res.as_object_mut() {
            obj.insert(resource::LINKS.to_string(), Value::Object(links));
        }
    }
}

impl Adapter for SimpleXmlResponseAdapter {
    fn name(&self) -> &str {
        SIMPLE_XML_RESPONSE
    }

    fn transforms_responses(&self) -> bool {
        true
    }

    fn injects_links(&self) -> bool {
        true
    }

    fn transform_response(
        &self,
        body: &[u8],
        _content_type: &str,
    ) -> GatewayResult<TransformedResponse> {
        let text = std::str::from_utf8(body).map_err(|e| GatewayError::Transformation {
            detail: format!("response body is not valid UTF-8: {}", e),
        })?;

        let (root_name, value) = parse_document(text)?;
        Ok(TransformedResponse {
            body: canonicalize_root(&root_name, value),
            content_type: CANONICAL_CONTENT_TYPE,
        })
    }

    fn inject_links(
        &self,
        res: &mut Value,
        config: &ServiceConfig,
        stage: &str,
        api_name: &str,
        resource_name: &str,
    ) {
        if resource::is_collection(res) {
            if let Some(items) = resource::items_mut(res) {
                for item in items {
                    self.inject_resource_links(item, config, stage, api_name, resource_name);
                }
            }
            let collection_self = format!("/{}/{}/{}", stage, api_name, resource_name);
            if let Some(obj) = res.as_object_mut() {
                obj.insert(
                    resource::LINKS.to_string(),
                    json!({ resource::SELF_LINK: collection_self }),
                );
            }
        } else {
            self.inject_resource_links(res, config, stage, api_name, resource_name);
        }
    }
}

fn build_relationship_href(
    res: &Value,
    rel: &RelationshipConfig,
    stage: &str,
) -> Option<String> {
    match &rel.url_pattern {
        Some(pattern) => {
            let substituted = substitute_placeholders(pattern, res)?;
            Some(format!("/{}/{}{}", stage, rel.target_api, substituted))
        }
        None => {
            let value = field_value(res, &rel.source_field)?;
            Some(format!(
                "/{}/{}/{}/{}",
                stage,
                rel.target_api,
                rel.target_resource,
                urlencoding::encode(&value)
            ))
        }
    }
}

/// Substitute every `{field}` placeholder from the resource's own fields,
/// URL-encoding the values. Returns None if any referenced field is absent.
fn substitute_placeholders(pattern: &str, res: &Value) -> Option<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(pattern) {
        let matched = caps.get(0).expect("capture 0 always present");
        let value = field_value(res, &caps[1])?;
        out.push_str(&pattern[last..matched.start()]);
        out.push_str(&urlencoding::encode(&value));
        last = matched.end();
    }

    out.push_str(&pattern[last..]);
    Some(out)
}

fn field_value(res: &Value, field: &str) -> Option<String> {
    match res.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ============================================
// XML parsing
// ============================================

fn parse_document(text: &str) -> GatewayResult<(String, Value)> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let name = element_name(&e)?;
                let value = build_element(&mut reader, &e)?;
                return Ok((name, value));
            }
            Event::Empty(e) => {
                let name = element_name(&e)?;
                return Ok((name, empty_element(&e)?));
            }
            Event::Eof => {
                return Err(GatewayError::Transformation {
                    detail: "document contains no root element".to_string(),
                })
            }
            // Prolog, comments, processing instructions
            _ => continue,
        }
    }
}

fn build_element(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> GatewayResult<Value> {
    let mut children: Map<String, Value> = Map::new();
    let mut text = String::new();

    collect_attributes(start, &mut children)?;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let name = element_name(&e)?;
                let value = build_element(reader, &e)?;
                push_child(&mut children, name, value);
            }
            Event::Empty(e) => {
                let name = element_name(&e)?;
                let value = empty_element(&e)?;
                push_child(&mut children, name, value);
            }
            Event::Text(t) => {
                text.push_str(&t.unescape().map_err(xml_error)?);
            }
            Event::CData(c) => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(GatewayError::Transformation {
                    detail: "unexpected end of document".to_string(),
                })
            }
            _ => continue,
        }
    }

    if children.is_empty() {
        Ok(scalar_value(&text))
    } else {
        Ok(Value::Object(children))
    }
}

fn empty_element(e: &BytesStart<'_>) -> GatewayResult<Value> {
    let mut attrs = Map::new();
    collect_attributes(e, &mut attrs)?;
    if attrs.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(attrs))
    }
}

fn collect_attributes(e: &BytesStart<'_>, target: &mut Map<String, Value>) -> GatewayResult<()> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| GatewayError::Transformation {
            detail: format!("malformed XML attribute: {}", e),
        })?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        target.insert(key, Value::String(value));
    }
    Ok(())
}

fn element_name(e: &BytesStart<'_>) -> GatewayResult<String> {
    std::str::from_utf8(e.local_name().as_ref())
        .map(ToString::to_string)
        .map_err(|e| GatewayError::Transformation {
            detail: format!("element name is not valid UTF-8: {}", e),
        })
}

fn push_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.remove(&name) {
        Some(Value::Array(mut existing)) => {
            existing.push(value);
            children.insert(name, Value::Array(existing));
        }
        Some(first) => {
            children.insert(name, Value::Array(vec![first, value]));
        }
        None => {
            children.insert(name, value);
        }
    }
}

fn xml_error(e: impl std::fmt::Display) -> GatewayError {
    GatewayError::Transformation {
        detail: format!("malformed XML: {}", e),
    }
}

/// Parse element text into the narrowest JSON scalar whose rendering
/// round-trips to the original text.
fn scalar_value(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed == "true" {
        return Value::Bool(true);
    }
    if trimmed == "false" {
        return Value::Bool(false);
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        if i.to_string() == trimmed {
            return json!(i);
        }
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.to_string() == trimmed {
            return json!(f);
        }
    }
    Value::String(trimmed.to_string())
}

/// Decide whether the parsed root is a single resource or a collection.
fn canonicalize_root(root_name: &str, value: Value) -> Value {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                let (child_name, child) = map.iter().next().expect("len checked");
                let is_collection = match child {
                    Value::Array(_) => true,
                    // A plural root wrapping one singular child is a
                    // one-element collection, not a nested resource.
                    Value::Object(_) | Value::Null => {
                        format!("{}s", child_name) == root_name
                    }
                    _ => false,
                };
                if is_collection {
                    let (_, child) = map.into_iter().next().expect("len checked");
                    let items = match child {
                        Value::Array(items) => items,
                        Value::Null => vec![],
                        single => vec![single],
                    };
                    return json!({ resource::ITEMS: items });
                }
            }
            Value::Object(map)
        }
        Value::Null => json!({}),
        scalar => scalar,
    }
}
