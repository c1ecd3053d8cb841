//! Process-wide token cache
//!
//! Keyed store of `(token, expiry)` pairs with leeway-aware validity checks
//! and explicit invalidation. One cache instance is shared by every client a
//! governor builds; entries for different keys are independent.
//!
//! Per key the entry moves `Absent -> Valid (save) -> Stale (clock passes
//! the expiry-leeway boundary) -> Absent (clear or overwrite)`. Stale and
//! absent are indistinguishable to lookups; a stale entry stays physically
//! present until a save overwrites it or a clear removes it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use steward_domain::AuthToken;
use tracing::debug;

/// Keyed store of cached authentication tokens
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: RwLock<HashMap<String, AuthToken>>,
}

impl TokenCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token for `key` if it is still valid under the
    /// given leeway.
    ///
    /// A stale entry reports absent but is not deleted; only an overwrite or
    /// an explicit [`clear`](Self::clear) removes it.
    #[must_use]
    pub fn token(&self, key: &str, leeway_seconds: i64) -> Option<String> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(entry) if entry.is_valid(leeway_seconds) => {
                debug!(instance = %key, "token cache hit");
                Some(entry.token.clone())
            }
            Some(_) => {
                debug!(instance = %key, "token cache entry stale");
                None
            }
            None => {
                debug!(instance = %key, "token cache miss");
                None
            }
        }
    }

    /// Unconditionally overwrite the entry for `key`.
    pub fn save(&self, key: &str, token: String, expires_at: DateTime<Utc>) {
        debug!(instance = %key, %expires_at, "token cached");
        self.entries.write().insert(key.to_string(), AuthToken::new(token, expires_at));
    }

    /// Remove the entry for `key`, forcing the next lookup to miss.
    ///
    /// Called when a request is rejected as unauthenticated.
    pub fn clear(&self, key: &str) {
        if self.entries.write().remove(key).is_some() {
            debug!(instance = %key, "token cache entry cleared");
        }
    }
}
