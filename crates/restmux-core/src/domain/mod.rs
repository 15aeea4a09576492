//! Core domain entities: the resource envelope and per-backend service configuration.

pub mod resource;
pub mod service_config;
