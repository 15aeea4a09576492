//! HTTP handlers for the gateway server
//!
//! The `gateway` handler is the orchestrator: it ties routing, the backend
//! invoker, the adapter pipeline, link rewriting, content negotiation, and
//! the include resolver into the end-to-end request lifecycle.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use restmux_core::{AdapterContext, GatewayError, LinkRewriter};

use crate::include::IncludeResolver;
use crate::invoke::BackendResponse;
use crate::negotiate::ResponseMode;
use crate::pipeline::AdapterPipeline;
use crate::routing::{extract_api_name, extract_resource_name};

use super::AppState;

/// Largest request body the gateway will buffer for forwarding.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    debug!("[Gateway] Health check");
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Gateway orchestrator: every non-health request lands here.
pub async fn gateway(State(state): State<AppState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let method = parts.method;
    let uri = parts.uri;
    let headers = parts.headers;

    if method == Method::OPTIONS {
        return preflight_response();
    }

    let path = uri.path();

    let routed = match state.routes.resolve(path) {
        Ok(routed) => routed,
        Err(e) => {
            warn!("[Gateway] {}", e);
            return error_response(&e);
        }
    };

    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    let mode = ResponseMode::from_accept(accept);

    let api_name = extract_api_name(path);
    let config = state.config_store.load(api_name).await;
    let ctx = AdapterContext::from_config(api_name, config, &state.registry);

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(&GatewayError::Internal(format!(
                "failed to read request body: {}",
                e
            )))
        }
    };
    let mut body = (!body.is_empty()).then(|| body.to_vec());

    if mode.transforms() {
        if let Some(adapter) = ctx.adapter.as_ref().filter(|a| a.transforms_requests()) {
            if let Some(payload) = body.take() {
                match adapter.transform_request(payload) {
                    Ok(transformed) => body = Some(transformed),
                    Err(e) => {
                        warn!("[Gateway] {}", e);
                        return error_response(&e);
                    }
                }
            }
        }
    }

    let backend_url = match uri.query() {
        Some(query) => format!("{}{}?{}", routed.base_url, path, query),
        None => format!("{}{}", routed.base_url, path),
    };

    let response = match state
        .fetcher
        .fetch(&backend_url, method, body, &headers)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!("[Gateway] Primary fetch failed: {}", e);
            return error_response(&e);
        }
    };

    // Backend HTTP errors pass through verbatim: status and body are the
    // backend's own, not rewritten, not wrapped.
    if !response.is_success() {
        debug!(
            "[Gateway] Backend '{}' responded {}, passing through",
            routed.api_name, response.status
        );
        return raw_response(response);
    }

    if !mode.transforms() {
        return raw_response(response);
    }

    let pipeline = AdapterPipeline::new(&state.stage);
    let mut resource = match pipeline.process(&response, &ctx, extract_resource_name(path)) {
        Ok(resource) => resource,
        Err(e) => {
            warn!("[Gateway] {}", e);
            return error_response(&e);
        }
    };

    LinkRewriter::new(&state.stage).rewrite(&mut resource);

    if mode.aggregates() {
        let includes = IncludeResolver::parse_include(include_param(uri.query()).as_deref());
        if !includes.is_empty() {
            let resolver = IncludeResolver::new(
                state.fetcher.clone(),
                state.routes.clone(),
                state.config_store.clone(),
                state.registry.clone(),
                &state.stage,
            );
            resolver.resolve(&mut resource, &includes, &headers).await;
        }
    }

    (
        response.status,
        [(
            header::CONTENT_TYPE,
            mode.content_type(&response.content_type).to_string(),
        )],
        Json(resource),
    )
        .into_response()
}

/// Extract the `include` parameter from a raw query string.
fn include_param(query: Option<&str>) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "include")
        .map(|(_, value)| value.into_owned())
}

/// The backend payload exactly as received, with its own content type.
fn raw_response(response: BackendResponse) -> Response {
    let mut builder = Response::builder().status(response.status);
    if !response.content_type.is_empty() {
        builder = builder.header(header::CONTENT_TYPE, response.content_type.as_str());
    }
    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|e| {
            error_response(&GatewayError::Internal(format!(
                "failed to build response: {}",
                e
            )))
        })
}

/// CORS preflight: 200 with an empty body.
fn preflight_response() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                "GET, POST, PUT, PATCH, DELETE, OPTIONS",
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "Accept, Authorization, Content-Type, X-Request-Id, X-Correlation-Id",
            ),
        ],
    )
        .into_response()
}

/// Structured JSON error envelope with a machine-readable code.
fn error_response(err: &GatewayError) -> Response {
    let status = match err {
        GatewayError::NoBackendFound { .. } => StatusCode::NOT_FOUND,
        GatewayError::Upstream { .. } | GatewayError::Transformation { .. } => {
            StatusCode::BAD_GATEWAY
        }
        GatewayError::Config { .. } | GatewayError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let mut error = json!({
        "code": err.code(),
        "message": err.to_string(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    if let Some(detail) = err.detail() {
        error["detail"] = json!(detail);
    }

    (status, Json(json!({ "error": error }))).into_response()
}
