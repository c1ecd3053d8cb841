//! Instance store port interfaces
//!
//! The metadata/credentials store is an external collaborator; this port is
//! the only contract the governor relies on. Implementations live in
//! `steward-infra` (file-backed) and in test doubles.

use async_trait::async_trait;
use steward_domain::{InstanceRecord, Result};

/// Trait for enumerating and loading instance records
#[async_trait]
pub trait InstanceRepository: Send + Sync {
    /// List the keys of all configured instances, sorted lexicographically.
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Load the metadata and credentials record for one instance.
    ///
    /// # Errors
    /// - `StewardError::NotFound` when the store has no record for `key`
    /// - `StewardError::Validation` when the record is malformed (missing
    ///   required field, wrong shape, ambiguous default credential entry)
    async fn load(&self, key: &str) -> Result<InstanceRecord>;
}
