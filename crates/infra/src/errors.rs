//! Conversions from transport errors into domain errors

use steward_domain::StewardError;

/// Map a transport-level failure against an instance to a domain error.
///
/// Timeouts and non-2xx transport errors are both `Upstream`; the contract
/// treats them identically (neither is retried beyond the single 401 retry
/// handled by the client).
pub(crate) fn transport_error(instance: &str, err: &reqwest::Error) -> StewardError {
    if err.is_timeout() {
        return StewardError::Upstream {
            instance: instance.to_string(),
            status: None,
            detail: "request timed out".to_string(),
        };
    }

    StewardError::Upstream {
        instance: instance.to_string(),
        status: err.status().map(|s| s.as_u16()),
        detail: err.to_string(),
    }
}
