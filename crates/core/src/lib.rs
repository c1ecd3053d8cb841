//! # Steward Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the instance store
//! - The manifest reconciliation algorithm
//!
//! ## Architecture Principles
//! - Only depends on `steward-domain`
//! - No HTTP, file, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod sync;

// Infrastructure ports
pub mod instance_ports;

// Re-export specific items to avoid ambiguity
pub use instance_ports::InstanceRepository;
pub use sync::{synchronize, CreatedEntity, SyncOutcome, SyncStrategy};
