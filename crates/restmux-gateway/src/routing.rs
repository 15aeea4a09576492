//! Backend routing
//!
//! Maps a request path's first segment (plus singular/plural aliases) to a
//! configured backend base URL. Routing is purely syntactic over a small
//! static table built at startup; it performs no network I/O.

use std::collections::HashMap;
use std::env;

use restmux_core::{strip_stage_segment, GatewayError, GatewayResult};
use tracing::{debug, info};

/// Environment prefix declaring backends: `RESTMUX_BACKEND_INCOME_TAX=http://...`
/// registers backend `income-tax`.
const BACKEND_ENV_PREFIX: &str = "RESTMUX_BACKEND_";

/// One routed backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedBackend {
    /// Canonical backend name (also the config lookup directory).
    pub api_name: String,
    /// Base URL requests are forwarded to.
    pub base_url: String,
}

/// Static prefix table mapping path segments to backends.
#[derive(Debug, Default)]
pub struct RouteTable {
    /// segment (canonical name or alias) -> canonical name
    segments: HashMap<String, String>,
    /// canonical name -> base URL
    backends: HashMap<String, String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from `RESTMUX_BACKEND_*` environment variables.
    pub fn from_env() -> Self {
        let mut table = Self::new();
        for (key, value) in env::vars() {
            if let Some(name) = key.strip_prefix(BACKEND_ENV_PREFIX) {
                let api_name = name.to_ascii_lowercase().replace('_', "-");
                table.register(&api_name, &value);
            }
        }
        table
    }

    /// Register a backend under its canonical name plus automatic
    /// singular/plural aliases of the first path segment.
    pub fn register(&mut self, api_name: &str, base_url: &str) {
        let base_url = base_url.trim_end_matches('/').to_string();
        info!("[Router] Registered backend '{}' -> {}", api_name, base_url);

        self.backends.insert(api_name.to_string(), base_url);
        self.segments
            .insert(api_name.to_string(), api_name.to_string());

        // Plural/singular aliases; explicit registrations win.
        let plural = format!("{}s", api_name);
        self.segments
            .entry(plural)
            .or_insert_with(|| api_name.to_string());
        if let Some(singular) = api_name.strip_suffix('s') {
            self.segments
                .entry(singular.to_string())
                .or_insert_with(|| api_name.to_string());
        }
    }

    /// Register an additional path alias for an already-registered backend.
    pub fn register_alias(&mut self, alias: &str, api_name: &str) {
        self.segments
            .insert(alias.to_string(), api_name.to_string());
    }

    /// Canonical names of every registered backend.
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    /// Resolve a request path to its backend.
    pub fn resolve(&self, path: &str) -> GatewayResult<RoutedBackend> {
        let segment = extract_api_name(path);
        let api_name = self
            .segments
            .get(segment)
            .ok_or_else(|| GatewayError::NoBackendFound {
                path: path.to_string(),
            })?;
        let base_url = self
            .backends
            .get(api_name)
            .ok_or_else(|| GatewayError::NoBackendFound {
                path: path.to_string(),
            })?;

        Ok(RoutedBackend {
            api_name: api_name.clone(),
            base_url: base_url.clone(),
        })
    }

    /// Translate a gateway-relative (possibly stage-prefixed or absolute)
    /// href back to the internal backend URL that serves it.
    ///
    /// Used by the include resolver: hrefs in already-rewritten responses
    /// point at the gateway, not at backends.
    pub fn resolve_href(&self, href: &str, stage: &str) -> GatewayResult<(RoutedBackend, String)> {
        let path = normalize_href(href);
        let path = strip_stage_segment(&path, stage);
        let backend = self.resolve(path)?;
        let url = format!("{}{}", backend.base_url, path);
        debug!("[Router] Resolved href '{}' -> {}", href, url);
        Ok((backend, path.to_string()))
    }
}

/// The API name used for configuration lookup: the first path segment,
/// regardless of trailing resource/id/query segments.
pub fn extract_api_name(path: &str) -> &str {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let end = trimmed.find(['/', '?']).unwrap_or(trimmed.len());
    &trimmed[..end]
}

/// The resource segment of a path (second segment), falling back to the API
/// name for paths with no resource part.
pub fn extract_resource_name(path: &str) -> &str {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let mut segments = trimmed.split(['/', '?']);
    let first = segments.next().unwrap_or("");
    match segments.next() {
        Some(second) if !second.is_empty() => second,
        _ => first,
    }
}

fn normalize_href(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        match url::Url::parse(href) {
            Ok(parsed) => {
                let mut path = parsed.path().to_string();
                if let Some(query) = parsed.query() {
                    path.push('?');
                    path.push_str(query);
                }
                path
            }
            Err(_) => href.to_string(),
        }
    } else if href.starts_with('/') {
        href.to_string()
    } else {
        format!("/{}", href)
    }
}
