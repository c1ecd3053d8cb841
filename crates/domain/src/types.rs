//! Instance-scoped value objects
//!
//! Everything here is immutable once constructed: metadata and credentials
//! are loaded from the instance store and never mutated, and a
//! `ResolvedConfig` is recomputed from scratch whenever a client is rebuilt.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TOKEN_FALLBACK_TTL_SECS, DEFAULT_TOKEN_LEEWAY_SECS,
};

/// Connection metadata for one instance of an integrated service
///
/// Identifies *where* to connect; secrets live in [`InstanceCredentials`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceMetadata {
    /// Key identifying the instance (e.g., "shop-eu", "pantry-home")
    pub instance_key: String,

    /// Base URL of the instance API (e.g., "https://shop-eu.example.com")
    pub base_url: String,

    /// Path of the credential-exchange endpoint, relative to `base_url`
    #[serde(default = "default_auth_path")]
    pub auth_path: String,
}

pub(crate) fn default_auth_path() -> String {
    "/api/auth/login".to_string()
}

impl InstanceMetadata {
    /// Absolute URL of the credential-exchange endpoint.
    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.auth_path)
    }
}

/// Secret credentials for one instance
///
/// Never serialized outward; `Debug` redacts the secret so credentials can
/// appear in error context without leaking.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct InstanceCredentials {
    /// Admin identity used for the credential exchange (email or username)
    pub identity: String,

    /// Password or API key for `identity`
    pub secret: String,
}

impl fmt::Debug for InstanceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceCredentials")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Metadata and credentials loaded together from the instance store
#[derive(Debug, Clone)]
pub struct InstanceRecord {
    pub metadata: InstanceMetadata,
    pub credentials: InstanceCredentials,
}

/// Fully resolved per-instance configuration
///
/// Merge of metadata, credentials, and fixed defaults. Built each time a
/// client is (re)constructed; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub metadata: InstanceMetadata,
    pub credentials: InstanceCredentials,

    /// Timeout applied to every outbound request
    pub request_timeout: Duration,

    /// Safety margin subtracted from token expiry during cache lookups
    pub token_leeway_seconds: i64,

    /// Assumed token lifetime when expiry cannot be decoded from the token
    pub token_fallback_ttl_seconds: i64,
}

impl ResolvedConfig {
    /// Merge an instance record with the fixed defaults.
    #[must_use]
    pub fn new(record: InstanceRecord) -> Self {
        Self {
            metadata: record.metadata,
            credentials: record.credentials,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            token_leeway_seconds: DEFAULT_TOKEN_LEEWAY_SECS,
            token_fallback_ttl_seconds: DEFAULT_TOKEN_FALLBACK_TTL_SECS,
        }
    }

    /// Override the request timeout (e.g., for latency-sensitive callers).
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Key of the instance this configuration was resolved for.
    #[must_use]
    pub fn instance_key(&self) -> &str {
        &self.metadata.instance_key
    }
}

/// A short-lived authentication token with its absolute expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// Opaque bearer token string
    pub token: String,

    /// Absolute expiration timestamp (UTC)
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    #[must_use]
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// Whether the token is still usable given the configured leeway.
    ///
    /// A token is valid iff `now + leeway < expires_at`; the margin keeps a
    /// token from expiring while a request carrying it is in flight.
    #[must_use]
    pub fn is_valid(&self, leeway_seconds: i64) -> bool {
        Utc::now() + chrono::Duration::seconds(leeway_seconds) < self.expires_at
    }
}
