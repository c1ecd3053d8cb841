//! Per-instance auth provider
//!
//! Obtains a valid bearer token for one instance: the token cache is
//! consulted first, and only on a miss is a credential exchange performed
//! against the instance's authentication endpoint.
//!
//! Token expiry is derived from the token itself when it is a JWT carrying a
//! numeric `exp` claim; this avoids an extra round trip to discover the
//! expiry. When the token is opaque (or the format changes) the provider
//! falls back to a configured TTL, which keeps the lifecycle correct, if
//! conservative.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::Value;
use steward_domain::{ResolvedConfig, Result, StewardError};
use tracing::{debug, warn};

use crate::errors::transport_error;
use crate::instances::TokenCache;

/// Obtains and caches bearer tokens for one instance
#[derive(Debug)]
pub struct AuthProvider {
    config: Arc<ResolvedConfig>,
    cache: Arc<TokenCache>,
    http: reqwest::Client,
}

impl AuthProvider {
    /// Create a provider for the given resolved configuration, wired to the
    /// shared token cache.
    ///
    /// # Errors
    /// Returns `StewardError::Internal` if the HTTP client cannot be built.
    pub fn new(config: Arc<ResolvedConfig>, cache: Arc<TokenCache>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StewardError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, cache, http })
    }

    /// Return a valid token for this instance, exchanging credentials only
    /// on a cache miss.
    ///
    /// # Errors
    /// - `StewardError::Auth` when the exchange is rejected upstream
    /// - `StewardError::MalformedResponse` when the exchange succeeds but
    ///   the body carries no usable token
    /// - `StewardError::Upstream` on transport failures and timeouts
    pub async fn get_token(&self) -> Result<String> {
        let key = self.config.instance_key();

        if let Some(token) = self.cache.token(key, self.config.token_leeway_seconds) {
            return Ok(token);
        }

        debug!(instance = %key, "token cache miss, exchanging credentials");
        let token = self.exchange_credentials().await?;
        let expires_at = self.token_expiry(&token);
        self.cache.save(key, token.clone(), expires_at);

        Ok(token)
    }

    /// Perform the credential exchange against the instance's auth endpoint.
    async fn exchange_credentials(&self) -> Result<String> {
        let key = self.config.instance_key();
        let url = self.config.metadata.auth_url();

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "username": self.config.credentials.identity,
                "password": self.config.credentials.secret,
            }))
            .send()
            .await
            .map_err(|e| transport_error(key, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StewardError::Auth { instance: key.to_string(), status: status.as_u16() });
        }

        let body: Value = response.json().await.map_err(|e| {
            StewardError::MalformedResponse(format!(
                "credential exchange response is not valid JSON: {e}"
            ))
        })?;

        body.get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                StewardError::MalformedResponse(
                    "credential exchange response is missing a non-empty 'token' field"
                        .to_string(),
                )
            })
    }

    /// Derive the expiry for a freshly exchanged token.
    ///
    /// Falls back to `now + token_fallback_ttl_seconds` when the token does
    /// not self-declare its expiry; the fallback is logged and non-fatal.
    fn token_expiry(&self, token: &str) -> DateTime<Utc> {
        decode_exp_claim(token).unwrap_or_else(|| {
            warn!(
                instance = %self.config.instance_key(),
                fallback_ttl_seconds = self.config.token_fallback_ttl_seconds,
                "could not decode token expiry, applying fallback TTL"
            );
            Utc::now() + chrono::Duration::seconds(self.config.token_fallback_ttl_seconds)
        })
    }
}

/// Decode the `exp` claim of a JWT-shaped token.
///
/// Accepts only a three-segment token whose middle segment base64url-decodes
/// (after padding to a multiple of 4) into a JSON object with a numeric
/// `exp` Unix timestamp. Any structural deviation yields `None`.
fn decode_exp_claim(token: &str) -> Option<DateTime<Utc>> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return None;
    }

    let mut payload = segments[1].to_string();
    while payload.len() % 4 != 0 {
        payload.push('=');
    }

    let bytes = URL_SAFE.decode(payload).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;

    DateTime::from_timestamp(exp, 0)
}
