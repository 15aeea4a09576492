//! Adapter Pipeline
//!
//! Decides whether a backend response needs format conversion and applies
//! the configured adapter when it does. The rule: transform only when an
//! adapter is configured for the backend AND the declared `Content-Type`
//! requires conversion. Everything else parses as JSON directly.
//!
//! Parse failures are transformation errors surfaced to the client; they
//! are never silently defaulted to an empty body.

use serde_json::Value;
use tracing::debug;

use restmux_core::adapter::requires_conversion;
use restmux_core::{AdapterContext, GatewayError, GatewayResult};

use crate::invoke::BackendResponse;

/// Applies per-backend response transformation and link injection.
#[derive(Debug, Clone)]
pub struct AdapterPipeline {
    stage: String,
}

impl AdapterPipeline {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
        }
    }

    /// Produce the canonical JSON resource for a successful backend response.
    pub fn process(
        &self,
        response: &BackendResponse,
        ctx: &AdapterContext,
        resource_name: &str,
    ) -> GatewayResult<Value> {
        let adapter = ctx.adapter.as_ref().filter(|adapter| {
            adapter.transforms_responses() && requires_conversion(&response.content_type)
        });

        let Some(adapter) = adapter else {
            return serde_json::from_slice(&response.body).map_err(|e| {
                GatewayError::Transformation {
                    detail: format!("backend body is not valid JSON: {}", e),
                }
            });
        };

        debug!(
            "[Pipeline] Applying adapter '{}' for '{}' ({})",
            adapter.name(),
            ctx.api_name,
            response.content_type
        );

        let transformed = adapter.transform_response(&response.body, &response.content_type)?;
        let mut body = transformed.body;

        if adapter.injects_links() {
            if let Some(config) = &ctx.config {
                adapter.inject_links(&mut body, config, &self.stage, &ctx.api_name, resource_name);
            }
        }

        Ok(body)
    }
}
