//! TOML-backed instance repository
//!
//! Loads per-instance connection metadata and credentials from a TOML
//! manifest file:
//!
//! ```toml
//! [instances.pantry]
//! base_url = "http://pantry.local:9283"
//! auth_path = "/api/auth/login"        # optional
//!
//! [[instances.pantry.credentials]]
//! identity = "admin@example.com"
//! secret = "hunter2"
//! default = true                       # required iff several entries exist
//! ```
//!
//! Unreadable or unparsable files are `Config` errors; a missing instance
//! key is `NotFound`; a present-but-malformed record is `Validation`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use steward_core::InstanceRepository;
use steward_domain::{
    InstanceCredentials, InstanceMetadata, InstanceRecord, Result, StewardError,
};
use tracing::debug;

/// File-backed instance repository
pub struct TomlInstanceRepository {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    instances: BTreeMap<String, RawInstance>,
}

#[derive(Debug, Deserialize)]
struct RawInstance {
    base_url: Option<String>,
    auth_path: Option<String>,
    #[serde(default)]
    credentials: Vec<RawCredential>,
}

#[derive(Debug, Deserialize)]
struct RawCredential {
    identity: Option<String>,
    secret: Option<String>,
    #[serde(default)]
    default: bool,
}

impl TomlInstanceRepository {
    /// Create a repository reading from the given manifest file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_manifest(&self) -> Result<ManifestFile> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            StewardError::Config(format!(
                "failed to read instance manifest {}: {e}",
                self.path.display()
            ))
        })?;

        toml::from_str(&contents)
            .map_err(|e| StewardError::Config(format!("invalid instance manifest: {e}")))
    }
}

#[async_trait]
impl InstanceRepository for TomlInstanceRepository {
    async fn list_keys(&self) -> Result<Vec<String>> {
        let manifest = self.read_manifest().await?;
        // BTreeMap iteration order is already lexicographic.
        Ok(manifest.instances.into_keys().collect())
    }

    async fn load(&self, key: &str) -> Result<InstanceRecord> {
        let mut manifest = self.read_manifest().await?;
        let raw = manifest
            .instances
            .remove(key)
            .ok_or_else(|| StewardError::NotFound(key.to_string()))?;

        debug!(instance = %key, path = %self.path.display(), "instance record loaded");
        resolve_record(key, raw)
    }
}

/// Validate a raw manifest entry into an immutable instance record.
fn resolve_record(key: &str, raw: RawInstance) -> Result<InstanceRecord> {
    let base_url = raw
        .base_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            StewardError::Validation(format!("instance '{key}' is missing 'base_url'"))
        })?;

    let credential = select_credential(key, raw.credentials)?;

    Ok(InstanceRecord {
        metadata: InstanceMetadata {
            instance_key: key.to_string(),
            base_url,
            auth_path: raw.auth_path.unwrap_or_else(|| "/api/auth/login".to_string()),
        },
        credentials: credential,
    })
}

/// Pick the effective credential entry for an instance.
///
/// A single entry is accepted as-is, flagged or not. Among several entries,
/// exactly one must be flagged `default`; zero or more than one is an
/// ambiguous selection and rejected.
fn select_credential(key: &str, entries: Vec<RawCredential>) -> Result<InstanceCredentials> {
    let total = entries.len();
    if total == 0 {
        return Err(StewardError::Validation(format!(
            "instance '{key}' has no credential entries"
        )));
    }

    let chosen = if total == 1 {
        entries.into_iter().next()
    } else {
        let mut defaults: Vec<RawCredential> =
            entries.into_iter().filter(|c| c.default).collect();
        if defaults.len() != 1 {
            return Err(StewardError::Validation(format!(
                "instance '{key}' has {total} credential entries but {} flagged as default; \
                 exactly one is required",
                defaults.len()
            )));
        }
        defaults.pop()
    };

    let Some(raw) = chosen else {
        return Err(StewardError::Internal(format!(
            "credential selection for instance '{key}' produced no entry"
        )));
    };

    match (raw.identity, raw.secret) {
        (Some(identity), Some(secret)) if !identity.is_empty() && !secret.is_empty() => {
            Ok(InstanceCredentials { identity, secret })
        }
        _ => Err(StewardError::Validation(format!(
            "credential entry for instance '{key}' is missing 'identity' or 'secret'"
        ))),
    }
}
