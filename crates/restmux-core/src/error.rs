//! Gateway error taxonomy
//!
//! Only routing failures, transformation failures, and connectivity failures
//! to the primary resource surface to clients. Everything else (invalid
//! include names, failed secondary fetches, malformed service configuration)
//! degrades gracefully at the point of occurrence.

use thiserror::Error;

/// Errors raised by the gateway engine.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No backend is configured for the request path.
    #[error("no backend found for path '{path}'")]
    NoBackendFound { path: String },

    /// A backend was unreachable or failed at the transport layer.
    #[error("upstream request to '{url}' failed")]
    Upstream { url: String, detail: String },

    /// An adapter could not convert the backend payload to canonical JSON.
    #[error("response transformation failed: {detail}")]
    Transformation { detail: String },

    /// A service configuration resource exists but cannot be used.
    #[error("service configuration for '{api_name}' is invalid: {detail}")]
    Config { api_name: String, detail: String },

    /// Anything that indicates a bug in the gateway itself.
    #[error("internal gateway error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Machine-readable code carried in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::NoBackendFound { .. } => "NO_BACKEND_FOUND",
            GatewayError::Upstream { .. } => "UPSTREAM_ERROR",
            GatewayError::Transformation { .. } => "TRANSFORMATION_ERROR",
            GatewayError::Config { .. } => "CONFIGURATION_ERROR",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Upstream diagnostic detail, where one exists.
    pub fn detail(&self) -> Option<&str> {
        match self {
            GatewayError::Upstream { detail, .. } => Some(detail),
            GatewayError::Transformation { detail } => Some(detail),
            GatewayError::Config { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
