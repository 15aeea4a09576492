//! Content negotiation
//!
//! The inbound `Accept` header selects one of three mutually exclusive
//! response modes, with strict precedence: raw pass-through, then simple
//! REST, then the aggregated default.

use restmux_core::media;

/// Negotiated response contract for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Exact backend payload and content type; no gateway opinions.
    PassThrough,
    /// Adapter transformation and link rewriting, but no aggregation.
    SimpleRest,
    /// Full pipeline including `include` aggregation. The default.
    Aggregated,
}

impl ResponseMode {
    /// Select the mode from an `Accept` header value.
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some(accept) if accept.contains(media::RAW) => ResponseMode::PassThrough,
            Some(accept) if accept.contains(media::JSON) => ResponseMode::SimpleRest,
            _ => ResponseMode::Aggregated,
        }
    }

    /// The `Content-Type` this mode responds with, given the backend's own.
    pub fn content_type<'a>(&self, backend_content_type: &'a str) -> &'a str {
        match self {
            ResponseMode::PassThrough => backend_content_type,
            ResponseMode::SimpleRest => media::JSON,
            ResponseMode::Aggregated => media::AGGREGATED,
        }
    }

    /// Whether the adapter pipeline and link rewriter run in this mode.
    pub fn transforms(&self) -> bool {
        !matches!(self, ResponseMode::PassThrough)
    }

    /// Whether the `include` parameter is honored in this mode.
    pub fn aggregates(&self) -> bool {
        matches!(self, ResponseMode::Aggregated)
    }
}
