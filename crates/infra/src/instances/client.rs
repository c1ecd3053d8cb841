//! Authorized instance client
//!
//! Wraps outbound requests to one instance: every request carries a bearer
//! token from the [`AuthProvider`], and a 401 triggers exactly one forced
//! token refresh followed by a single retry. A 401 on the retried request is
//! terminal; no other status is ever retried.

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use steward_domain::{ResolvedConfig, Result, StewardError};
use tracing::debug;
use uuid::Uuid;

use crate::errors::transport_error;
use crate::instances::{AuthProvider, TokenCache};

/// HTTP client bound to one instance
///
/// Never reused across instance keys; the governor caches one client per
/// key and evicts it when the instance record changes.
#[derive(Debug)]
pub struct InstanceClient {
    config: Arc<ResolvedConfig>,
    auth: AuthProvider,
    cache: Arc<TokenCache>,
    http: reqwest::Client,
}

impl InstanceClient {
    /// Build a client for the given resolved configuration, sharing the
    /// process-wide token cache.
    ///
    /// # Errors
    /// Returns `StewardError::Internal` if the HTTP client cannot be built.
    pub fn new(config: ResolvedConfig, cache: Arc<TokenCache>) -> Result<Self> {
        let config = Arc::new(config);
        let auth = AuthProvider::new(config.clone(), cache.clone())?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StewardError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, auth, cache, http })
    }

    /// Key of the instance this client is bound to.
    #[must_use]
    pub fn instance_key(&self) -> &str {
        self.config.instance_key()
    }

    /// Issue an authorized request and decode the JSON response body.
    ///
    /// On a 401 the cached token is invalidated, a fresh token is obtained
    /// through a real credential exchange, and the request is retried
    /// exactly once.
    ///
    /// # Errors
    /// - `StewardError::Upstream` for non-2xx responses (including a 401 on
    ///   the retry) and timeouts
    /// - `StewardError::MalformedResponse` when a success body is not JSON
    /// - `StewardError::Auth` when the token refresh itself is rejected
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        json_body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        let key = self.config.instance_key();
        let correlation_id = Uuid::new_v4();

        let token = self.auth.get_token().await?;
        let mut response =
            self.send(method.clone(), path, json_body, query, &token, correlation_id).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(
                instance = %key,
                %correlation_id,
                "token rejected upstream, refreshing and retrying once"
            );
            self.cache.clear(key);
            let fresh = self.auth.get_token().await?;
            response = self.send(method, path, json_body, query, &fresh, correlation_id).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(StewardError::Upstream {
                instance: key.to_string(),
                status: Some(status.as_u16()),
                detail: format!("HTTP {status}"),
            });
        }

        response.json().await.map_err(|e| {
            StewardError::MalformedResponse(format!("response body is not valid JSON: {e}"))
        })
    }

    /// Convenience wrapper for GET requests.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.request(Method::GET, path, None, query).await
    }

    /// Convenience wrapper for POST requests with a JSON body.
    pub async fn post(&self, path: &str, json_body: &Value) -> Result<Value> {
        self.request(Method::POST, path, Some(json_body), &[]).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        json_body: Option<&Value>,
        query: &[(&str, &str)],
        token: &str,
        correlation_id: Uuid,
    ) -> Result<Response> {
        let key = self.config.instance_key();
        let url =
            format!("{}{}", self.config.metadata.base_url.trim_end_matches('/'), path);

        debug!(instance = %key, %method, %url, %correlation_id, "sending instance request");

        let mut builder = self
            .http
            .request(method, &url)
            .header("Authorization", format!("Bearer {token}"));

        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = json_body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| transport_error(key, &e))?;
        debug!(
            instance = %key,
            status = response.status().as_u16(),
            %correlation_id,
            "received instance response"
        );

        Ok(response)
    }
}
