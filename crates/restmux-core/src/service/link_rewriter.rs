//! Link Rewriter
//!
//! Normalizes every href a client sees to a stage-prefixed, host-relative
//! gateway path. Clients must never observe internal backend hostnames.
//! Rewriting is pure, idempotent, and never fails: an unparseable href
//! degrades to best-effort path extraction with a warning.

use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::domain::resource;

/// Stage segments recognized (and stripped) when already present on a path.
const KNOWN_STAGES: &[&str] = &["dev", "prod", "staging"];

/// Rewrites hypermedia hrefs to canonical gateway paths for one stage.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    stage: String,
}

impl LinkRewriter {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Rewrite every `_links` href on the resource, and on each entry of an
    /// `items` array one level deep. Already-embedded `_included` resources
    /// are left alone; they were rewritten when they were fetched.
    pub fn rewrite(&self, res: &mut Value) {
        self.rewrite_links(res);
        if let Some(items) = resource::items_mut(res) {
            for item in items {
                self.rewrite_links(item);
            }
        }
    }

    fn rewrite_links(&self, res: &mut Value) {
        let Some(links) = res
            .get_mut(resource::LINKS)
            .and_then(Value::as_object_mut)
        else {
            return;
        };

        for (_, link) in links.iter_mut() {
            match link {
                Value::String(href) => *href = self.rewrite_href(href),
                Value::Object(obj) => {
                    if let Some(Value::String(href)) = obj.get_mut("href") {
                        *href = self.rewrite_href(href);
                    }
                }
                _ => {}
            }
        }
    }

    /// Normalize one href to `/{stage}/{backend path}?{query}`.
    pub fn rewrite_href(&self, href: &str) -> String {
        let path = if href.starts_with("http://") || href.starts_with("https://") {
            match Url::parse(href) {
                Ok(url) => {
                    let mut path = url.path().to_string();
                    if let Some(query) = url.query() {
                        path.push('?');
                        path.push_str(query);
                    }
                    path
                }
                Err(e) => {
                    warn!("[LinkRewriter] Unparseable href '{}': {}", href, e);
                    best_effort_path(href)
                }
            }
        } else if href.starts_with('/') {
            href.to_string()
        } else {
            format!("/{}", href)
        };

        let stripped = strip_stage_segment(&path, &self.stage);
        if stripped == "/" {
            format!("/{}", self.stage)
        } else {
            format!("/{}{}", self.stage, stripped)
        }
    }
}

/// Strip a leading stage segment (a well-known one, or the given configured
/// stage) from a path, if one is present.
pub fn strip_stage_segment<'a>(path: &'a str, stage: &str) -> &'a str {
    let stripped = strip_known_stage(path, KNOWN_STAGES);
    if stripped.len() == path.len() {
        strip_known_stage(path, &[stage])
    } else {
        stripped
    }
}

fn strip_known_stage<'a>(path: &'a str, stages: &[&str]) -> &'a str {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let segment_end = trimmed.find(['/', '?']).unwrap_or(trimmed.len());
    let segment = &trimmed[..segment_end];

    if !stages.contains(&segment) {
        return path;
    }

    let rest = &trimmed[segment_end..];
    if rest.is_empty() {
        "/"
    } else if rest.starts_with('?') {
        // A bare stage with a query string has no backend path to recover.
        path
    } else {
        rest
    }
}

fn best_effort_path(href: &str) -> String {
    let after_scheme = href
        .find("://")
        .map(|i| &href[i + 3..])
        .unwrap_or(href);
    match after_scheme.find('/') {
        Some(slash) => after_scheme[slash..].to_string(),
        None => "/".to_string(),
    }
}
