//! # Steward Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The per-instance token cache, auth provider, and HTTP client
//! - The instance governor (per-key client cache and lifecycle)
//! - The TOML-backed instance repository
//!
//! ## Architecture
//! - Implements traits defined in `steward-core`
//! - Depends on `steward-domain` and `steward-core`
//! - Contains all "impure" code (I/O, HTTP)

pub mod config;
pub mod instances;

mod errors;

// Re-export commonly used items
pub use config::TomlInstanceRepository;
pub use instances::{AuthProvider, InstanceClient, InstanceGovernor, TokenCache};
