//! Backend Invoker
//!
//! Performs outbound HTTP calls to routed backends. Only an explicit
//! allow-list of inbound headers is forwarded; everything else stops at the
//! gateway. Non-2xx backend responses are data, not errors - they pass
//! through to the client. Transport failures map to a generic upstream
//! error and are not retried.

use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use restmux_core::{media, GatewayError, GatewayResult};

/// Inbound request headers forwarded to backends. Everything else is dropped.
pub const FORWARDED_HEADERS: &[&str] = &[
    "authorization",
    "x-request-id",
    "x-correlation-id",
    "accept-language",
];

const REQUEST_ID_HEADER: &str = "x-request-id";

/// A buffered backend response.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Seam for outbound resource fetches; implemented over reqwest in
/// production and stubbed in tests.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        method: Method,
        body: Option<Vec<u8>>,
        headers: &HeaderMap,
    ) -> GatewayResult<BackendResponse>;
}

/// reqwest-backed invoker shared by all requests.
pub struct HttpBackendInvoker {
    client: reqwest::Client,
}

impl HttpBackendInvoker {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("restmux/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for HttpBackendInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceFetcher for HttpBackendInvoker {
    async fn fetch(
        &self,
        url: &str,
        method: Method,
        body: Option<Vec<u8>>,
        headers: &HeaderMap,
    ) -> GatewayResult<BackendResponse> {
        debug!("[Invoker] {} {}", method, url);

        let mut request = self.client.request(method, url);

        for name in FORWARDED_HEADERS {
            if let Some(value) = headers.get(*name) {
                request = request.header(*name, value.clone());
            }
        }

        // Backends always see a request id, generated here when the client
        // didn't send one.
        if !headers.contains_key(REQUEST_ID_HEADER) {
            request = request.header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        }

        if let Some(body) = body {
            request = request
                .header(http::header::CONTENT_TYPE, media::JSON)
                .body(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!("[Invoker] Request to {} failed: {}", url, e);
            GatewayError::Upstream {
                url: url.to_string(),
                detail: e.to_string(),
            }
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Upstream {
                url: url.to_string(),
                detail: format!("failed to read response body: {}", e),
            })?
            .to_vec();

        debug!(
            "[Invoker] {} responded {} ({} bytes, {})",
            url,
            status,
            body.len(),
            if content_type.is_empty() {
                "no content type"
            } else {
                &content_type
            }
        );

        Ok(BackendResponse {
            status,
            content_type,
            body,
        })
    }
}
