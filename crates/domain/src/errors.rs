//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Steward
///
/// Every failure crossing a component boundary is one of these kinds; callers
/// match on the discriminant, never on message text. The only internally
/// handled failure is the instance client's single 401 retry.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum StewardError {
    /// Requested instance key has no metadata/credentials record
    #[error("unknown instance: {0}")]
    NotFound(String),

    /// Malformed metadata/credentials record (missing field, wrong shape,
    /// ambiguous default credential selection)
    #[error("invalid instance record: {0}")]
    Validation(String),

    /// Credential exchange rejected by the upstream service
    #[error("authentication rejected for instance '{instance}' (HTTP {status})")]
    Auth { instance: String, status: u16 },

    /// Upstream returned a success status but an unusable body
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Non-2xx response or timeout from the integrated service
    #[error("upstream failure for instance '{instance}': {detail}")]
    Upstream { instance: String, status: Option<u16>, detail: String },

    /// Configuration error (unreadable instance manifest, bad format)
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl StewardError {
    /// Whether retrying the failed operation can reasonably succeed.
    ///
    /// Only upstream and authentication failures are transient; everything
    /// else is a configuration or data defect that a retry cannot fix.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::Upstream { .. })
    }

    /// Upstream HTTP status carried by this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } => Some(*status),
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias for Steward operations
pub type Result<T> = std::result::Result<T, StewardError>;
