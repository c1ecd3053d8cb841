//! Instance manifest configuration
//!
//! File-backed implementation of the [`steward_core::InstanceRepository`]
//! port. The manifest file is read on every load so that edits (e.g.,
//! credential rotation followed by `clear_client`) take effect without a
//! process restart.

mod repository;

pub use repository::TomlInstanceRepository;
