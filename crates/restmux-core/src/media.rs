//! Canonical media type constants used across the gateway.

/// Canonical JSON media type produced by adapters and the simple-rest mode.
pub const JSON: &str = "application/json";

/// Media type that requests byte-for-byte pass-through of backend payloads.
pub const RAW: &str = "application/vnd.raw";

/// Media type of aggregated responses, signalling that `_included` may be present.
pub const AGGREGATED: &str = "application/vnd.restmux+json";
