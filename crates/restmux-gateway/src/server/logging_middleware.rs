//! Request/response logging middleware
//!
//! Logs one line per request at debug level with method, path, status, and
//! elapsed time.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::debug;

pub async fn http_logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    debug!(
        "[Gateway] {} {} -> {} ({}ms)",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response
}
