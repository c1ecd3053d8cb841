//! # Steward Domain
//!
//! Business domain types and models for Steward.
//!
//! This crate contains:
//! - Instance-scoped value objects (metadata, credentials, resolved config)
//! - Domain error types and Result definitions
//! - Domain constants (timeouts, token leeway, fallback TTL)
//!
//! ## Architecture
//! - No dependencies on other Steward crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
