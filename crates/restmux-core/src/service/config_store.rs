//! Service Configuration Store
//!
//! Loads and caches per-backend `service.yaml` configuration. An absent file
//! means "no adapter, no relationships" and is cached like any other result,
//! so steady-state request handling never touches the filesystem. A malformed
//! file is logged and degraded to the same no-adapter state; it must never
//! fail an in-flight request.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::service_config::ServiceConfig;
use crate::error::{GatewayError, GatewayResult};

/// Cached, read-mostly store of per-backend service configuration.
pub struct ServiceConfigStore {
    specs_root: PathBuf,
    cache: RwLock<HashMap<String, Option<Arc<ServiceConfig>>>>,
}

impl ServiceConfigStore {
    pub fn new(specs_root: impl Into<PathBuf>) -> Self {
        Self {
            specs_root: specs_root.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn specs_root(&self) -> &Path {
        &self.specs_root
    }

    /// Load the configuration for an API, reading from disk on first use.
    ///
    /// Repeated loads return the same cached `Arc` until [`clear`] is called.
    /// Concurrent first loads race benignly: the first insert wins and later
    /// loaders observe it.
    ///
    /// [`clear`]: ServiceConfigStore::clear
    pub async fn load(&self, api_name: &str) -> Option<Arc<ServiceConfig>> {
        if let Some(cached) = self.cache.read().await.get(api_name) {
            return cached.clone();
        }

        let loaded = match self.read_from_disk(api_name).await {
            Ok(config) => config.map(Arc::new),
            Err(e) => {
                warn!("[ConfigStore] {}", e);
                None
            }
        };

        let mut cache = self.cache.write().await;
        cache
            .entry(api_name.to_string())
            .or_insert(loaded)
            .clone()
    }

    /// Drop every cached entry. The next load re-reads from disk.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
        info!("[ConfigStore] Cache cleared");
    }

    async fn read_from_disk(&self, api_name: &str) -> GatewayResult<Option<ServiceConfig>> {
        let path = self.specs_root.join(api_name).join("service.yaml");

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "[ConfigStore] No service config for '{}' ({}), using pass-through",
                    api_name,
                    path.display()
                );
                return Ok(None);
            }
            Err(e) => {
                return Err(GatewayError::Config {
                    api_name: api_name.to_string(),
                    detail: format!("failed to read {}: {}", path.display(), e),
                })
            }
        };

        let config: ServiceConfig =
            serde_yaml::from_str(&raw).map_err(|e| GatewayError::Config {
                api_name: api_name.to_string(),
                detail: format!("failed to parse {}: {}", path.display(), e),
            })?;

        info!(
            "[ConfigStore] Loaded config for '{}': {} adapter(s), {} relationship(s)",
            api_name,
            config.adapters.len(),
            config.relationships.len()
        );
        Ok(Some(config))
    }
}
