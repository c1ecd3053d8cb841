//! Per-instance client lifecycle
//!
//! Composition, leaves first: [`TokenCache`] stores `(token, expiry)` pairs
//! process-wide; [`AuthProvider`] turns credentials into cached tokens;
//! [`InstanceClient`] issues authorized requests with a single
//! 401-triggered refresh; [`InstanceGovernor`] owns the per-key client
//! cache and wires the three together on first access.

mod auth;
mod client;
mod governor;
mod token_cache;

pub use auth::AuthProvider;
pub use client::InstanceClient;
pub use governor::InstanceGovernor;
pub use token_cache::TokenCache;
