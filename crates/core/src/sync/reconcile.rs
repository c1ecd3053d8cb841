//! Reconciliation algorithm
//!
//! The algorithm is deliberately generic: the caller describes its manifest
//! and remote entity shapes through a [`SyncStrategy`] (explicit key and
//! identifier accessors, payload builder, async creator) and the algorithm
//! owns ordering, identifier allocation, and idempotence.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use steward_domain::Result;
use tracing::debug;

/// Caller-supplied strategy driving one reconciliation run
///
/// `Manifest` is the desired-state item shape, `Existing` the remote
/// snapshot item shape. Identifier extraction is an explicit accessor
/// rather than runtime introspection, so a strategy decides once how its
/// snapshot exposes numeric ids.
#[async_trait]
pub trait SyncStrategy: Send {
    /// Desired-state manifest item
    type Manifest: Sync;

    /// Entity already present on the remote instance
    type Existing: Sync;

    /// Natural key of a manifest item (e.g., a unit name)
    fn manifest_key(&self, item: &Self::Manifest) -> String;

    /// Comparable key of an existing remote entity
    fn existing_key(&self, item: &Self::Existing) -> String;

    /// Numeric identifier of an existing remote entity (0 if it has none)
    fn existing_id(&self, item: &Self::Existing) -> i64;

    /// Build the creation payload for a missing item, given the identifier
    /// the algorithm intends to assign.
    fn build_payload(&self, item: &Self::Manifest, candidate_id: i64) -> Value;

    /// Create the entity remotely.
    ///
    /// May return the created record (or a list containing it) so the
    /// algorithm can pick up a server-assigned identifier; `None` means the
    /// remote echoed nothing useful and the candidate id stands.
    async fn create(&mut self, payload: &Value) -> Result<Option<Value>>;
}

/// Audit record for one entity created during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEntity {
    /// Natural key of the manifest item that triggered the creation
    pub key: String,

    /// Identifier the entity ended up with
    pub identifier: i64,

    /// Payload that was sent to the creator
    pub payload: Value,
}

/// Outcome of one reconciliation run
///
/// Output only; covers both pre-existing and newly created entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Natural key to definitive numeric identifier, for every manifest key
    /// that now exists remotely
    pub identifier_by_key: BTreeMap<String, i64>,

    /// Entities created by this run, in manifest order
    pub created: Vec<CreatedEntity>,
}

/// Reconcile a manifest against a remote snapshot, creating what is missing.
///
/// Identifier allocation starts strictly above the maximum existing id and
/// tracks server-echoed ids, so two manifest items can never resolve to the
/// same identifier even when the remote assigns out-of-sequence ids.
///
/// Running the same manifest twice against a snapshot reflecting the first
/// run's creations creates nothing the second time.
///
/// # Errors
/// Propagates the first creator failure unchanged; entities created before
/// the failure are not rolled back.
pub async fn synchronize<S: SyncStrategy>(
    strategy: &mut S,
    manifest_items: &[S::Manifest],
    existing_items: &[S::Existing],
) -> Result<SyncOutcome> {
    let mut identifier_by_key: BTreeMap<String, i64> = BTreeMap::new();
    let mut next_identifier = 0i64;

    for item in existing_items {
        let id = strategy.existing_id(item);
        identifier_by_key.insert(strategy.existing_key(item), id);
        next_identifier = next_identifier.max(id);
    }

    let mut created = Vec::new();

    for item in manifest_items {
        let key = strategy.manifest_key(item);
        if identifier_by_key.contains_key(&key) {
            debug!(key = %key, "manifest entity already present, skipping");
            continue;
        }

        next_identifier += 1;
        let payload = strategy.build_payload(item, next_identifier);
        let response = strategy.create(&payload).await?;

        let identifier = response.as_ref().and_then(echoed_id).unwrap_or(next_identifier);
        debug!(key = %key, identifier, "created manifest entity");

        identifier_by_key.insert(key.clone(), identifier);
        created.push(CreatedEntity { key, identifier, payload });

        // Guard against a remote assigning ids ahead of our counter.
        next_identifier = next_identifier.max(identifier);
    }

    Ok(SyncOutcome { identifier_by_key, created })
}

/// Identifier echoed back by a creator response, if any.
///
/// Accepts either an object carrying a numeric `id` or a list whose first
/// element carrying a numeric `id` wins.
fn echoed_id(response: &Value) -> Option<i64> {
    match response {
        Value::Object(map) => map.get("id").and_then(Value::as_i64),
        Value::Array(items) => items.iter().find_map(|item| item.get("id").and_then(Value::as_i64)),
        _ => None,
    }
}
