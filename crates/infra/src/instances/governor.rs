//! Instance governor
//!
//! Owns a lazily populated cache of instance clients keyed by instance key,
//! composing the repository port, the auth provider, and the client. The
//! first `client_for` call per key loads the instance record; later calls
//! are pure cache hits. Staleness is corrected only by an explicit
//! `clear_client` (e.g., after credential rotation) — there is no
//! background refresh.
//!
//! Construction is not atomic under concurrent first access: two callers
//! racing on an uncached key may both load the record, and the last built
//! client wins the cache slot. A stale overwrite costs one duplicate load,
//! never a corrupted cache; callers needing stronger guarantees serialize
//! per key externally.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use steward_core::InstanceRepository;
use steward_domain::{ResolvedConfig, Result};
use tracing::{debug, info};

use crate::instances::{InstanceClient, TokenCache};

/// Per-instance client cache and lifecycle owner
pub struct InstanceGovernor {
    repository: Arc<dyn InstanceRepository>,
    token_cache: Arc<TokenCache>,
    clients: RwLock<HashMap<String, Arc<InstanceClient>>>,
}

impl InstanceGovernor {
    /// Create a governor over the given instance repository.
    #[must_use]
    pub fn new(repository: Arc<dyn InstanceRepository>) -> Self {
        Self {
            repository,
            token_cache: Arc::new(TokenCache::new()),
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// The token cache shared by every client this governor builds.
    #[must_use]
    pub fn token_cache(&self) -> &Arc<TokenCache> {
        &self.token_cache
    }

    /// List all configured instance keys, sorted and deduplicated.
    ///
    /// # Errors
    /// Propagates repository enumeration failures unchanged.
    pub async fn available_instances(&self) -> Result<Vec<String>> {
        let mut keys = self.repository.list_keys().await?;
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// Return the client for `key`, building and caching it on first use.
    ///
    /// # Errors
    /// Propagates `NotFound` / `Validation` from the repository load
    /// unchanged; `Internal` if client construction fails.
    pub async fn client_for(&self, key: &str) -> Result<Arc<InstanceClient>> {
        if let Some(client) = self.clients.read().get(key) {
            debug!(instance = %key, "instance client cache hit");
            return Ok(client.clone());
        }

        // Load without holding the lock; last write wins under races.
        let record = self.repository.load(key).await?;
        let config = ResolvedConfig::new(record);
        let client = Arc::new(InstanceClient::new(config, self.token_cache.clone())?);

        info!(instance = %key, "instance client constructed");
        self.clients.write().insert(key.to_string(), client.clone());

        Ok(client)
    }

    /// Evict the cached client for `key`, if present.
    ///
    /// The next `client_for` call reloads metadata and credentials; nothing
    /// is rebuilt eagerly.
    pub fn clear_client(&self, key: &str) {
        if self.clients.write().remove(key).is_some() {
            info!(instance = %key, "instance client evicted");
        }
    }
}
