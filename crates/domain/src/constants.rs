//! Domain-wide constants

/// Timeout applied to every outbound request against an instance (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Safety margin subtracted from a token's expiry before it is treated as
/// invalid, so a token never expires mid-flight (seconds)
pub const DEFAULT_TOKEN_LEEWAY_SECS: i64 = 60;

/// Assumed token lifetime when the expiry cannot be derived from the token
/// itself (seconds)
pub const DEFAULT_TOKEN_FALLBACK_TTL_SECS: i64 = 3600;
