//! Manifest reconciliation
//!
//! Diffs a desired manifest entity list against the entities already present
//! on a remote instance and creates only what is missing, allocating stable
//! identifiers as it goes. Additive-only: entries absent from the manifest
//! are never deleted or updated.

mod reconcile;

pub use reconcile::{synchronize, CreatedEntity, SyncOutcome, SyncStrategy};
