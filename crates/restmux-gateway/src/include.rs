//! Include Resolver
//!
//! Resolves the `include` query parameter: for each requested relationship
//! name, follows the resource's `_links` entry to the owning backend, runs
//! that backend's own adapter pipeline and link rewriting over the result,
//! and embeds it under `_included`. All fetches fan out concurrently and
//! are joined before the response is produced.
//!
//! Failure policy: a relationship absent from `_links` is a no-op, and a
//! failed secondary fetch is logged and omitted. Neither ever aborts the
//! primary response.

use futures::future::join_all;
use http::{HeaderMap, Method};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use restmux_core::{
    resource, AdapterContext, AdapterRegistry, GatewayError, GatewayResult, LinkRewriter,
    ServiceConfigStore,
};

use crate::invoke::ResourceFetcher;
use crate::pipeline::AdapterPipeline;
use crate::routing::{extract_api_name, extract_resource_name, RouteTable};

/// Fans out relationship fetches and merges them into `_included`.
pub struct IncludeResolver {
    fetcher: Arc<dyn ResourceFetcher>,
    routes: Arc<RouteTable>,
    config_store: Arc<ServiceConfigStore>,
    registry: Arc<AdapterRegistry>,
    pipeline: AdapterPipeline,
    rewriter: LinkRewriter,
}

impl IncludeResolver {
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        routes: Arc<RouteTable>,
        config_store: Arc<ServiceConfigStore>,
        registry: Arc<AdapterRegistry>,
        stage: &str,
    ) -> Self {
        Self {
            fetcher,
            routes,
            config_store,
            registry,
            pipeline: AdapterPipeline::new(stage),
            rewriter: LinkRewriter::new(stage),
        }
    }

    /// Parse a raw `include` parameter into relationship names.
    pub fn parse_include(raw: Option<&str>) -> Vec<String> {
        raw.map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
    }

    /// Fetch every requested relationship and merge results into the
    /// primary resource's `_included`.
    pub async fn resolve(&self, primary: &mut Value, includes: &[String], headers: &HeaderMap) {
        if includes.is_empty() {
            return;
        }

        if resource::is_collection(primary) {
            self.resolve_for_collection(primary, includes, headers).await;
        } else {
            self.resolve_for_single(primary, includes, headers).await;
        }
    }

    async fn resolve_for_single(
        &self,
        primary: &mut Value,
        includes: &[String],
        headers: &HeaderMap,
    ) {
        let targets: Vec<(String, String)> = includes
            .iter()
            .filter_map(|rel| {
                let href = resource::link_href(primary, rel);
                if href.is_none() {
                    debug!("[Include] Relationship '{}' not in _links, skipping", rel);
                }
                href.map(|href| (rel.clone(), href))
            })
            .collect();

        let results = join_all(targets.into_iter().map(|(rel, href)| async move {
            let result = self.fetch_related(&href, headers).await;
            (rel, result)
        }))
        .await;

        let mut included = Map::new();
        for (rel, result) in results {
            match result {
                Ok(related) => {
                    included.insert(rel, Value::Array(into_resource_array(related)));
                }
                Err(e) => {
                    warn!("[Include] Fetch for '{}' failed, omitting: {}", rel, e);
                }
            }
        }

        attach_included(primary, included);
    }

    /// For a collection primary the per-item fetches merge into a single
    /// collection-level `_included`, de-duplicated by resource id so a
    /// resource referenced by several items is embedded once.
    async fn resolve_for_collection(
        &self,
        primary: &mut Value,
        includes: &[String],
        headers: &HeaderMap,
    ) {
        let mut targets: Vec<(String, String)> = Vec::new();
        if let Some(items) = resource::items(primary) {
            for item in items {
                for rel in includes {
                    if let Some(href) = resource::link_href(item, rel) {
                        targets.push((rel.clone(), href));
                    }
                }
            }
        }

        let results = join_all(targets.into_iter().map(|(rel, href)| async move {
            let result = self.fetch_related(&href, headers).await;
            (rel, result)
        }))
        .await;

        let mut included: Map<String, Value> = Map::new();
        let mut seen_ids: HashMap<String, HashSet<String>> = HashMap::new();

        for (rel, result) in results {
            let related = match result {
                Ok(related) => related,
                Err(e) => {
                    warn!("[Include] Fetch for '{}' failed, omitting: {}", rel, e);
                    continue;
                }
            };

            let merged = included
                .entry(rel.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            let Some(merged) = merged.as_array_mut() else {
                continue;
            };
            let seen = seen_ids.entry(rel).or_default();

            for res in into_resource_array(related) {
                match resource::resource_id(&res) {
                    Some(id) => {
                        if seen.insert(id) {
                            merged.push(res);
                        }
                    }
                    // Resources without an id cannot be de-duplicated.
                    None => merged.push(res),
                }
            }
        }

        attach_included(primary, included);
    }

    /// Fetch one relationship target through its own backend's pipeline.
    async fn fetch_related(&self, href: &str, headers: &HeaderMap) -> GatewayResult<Value> {
        let (backend, path) = self.routes.resolve_href(href, self.rewriter.stage())?;
        let url = format!("{}{}", backend.base_url, path);

        let response = self.fetcher.fetch(&url, Method::GET, None, headers).await?;
        if !response.is_success() {
            return Err(GatewayError::Upstream {
                url,
                detail: format!("backend responded {}", response.status),
            });
        }

        let api_name = extract_api_name(&path);
        let config = self.config_store.load(api_name).await;
        let ctx = AdapterContext::from_config(api_name, config, &self.registry);

        let mut related = self
            .pipeline
            .process(&response, &ctx, extract_resource_name(&path))?;
        self.rewriter.rewrite(&mut related);
        Ok(related)
    }
}

/// A fetched collection contributes its `items`; a single resource becomes a
/// one-element array.
fn into_resource_array(related: Value) -> Vec<Value> {
    if resource::is_collection(&related) {
        match related.get(resource::ITEMS) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    } else {
        vec![related]
    }
}

fn attach_included(primary: &mut Value, included: Map<String, Value>) {
    if included.is_empty() {
        return;
    }
    if let Some(obj) = primary.as_object_mut() {
        obj.insert(resource::INCLUDED.to_string(), Value::Object(included));
    }
}
