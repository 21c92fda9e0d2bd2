//! Discovery orchestration.
//!
//! Ties the normalizer, fingerprinter, and reconciler together for a single
//! discovery event: normalize the raw path, fingerprint the file, look up
//! the previously stored fingerprint through the injected [`AssetLookup`],
//! and produce a mutation recommendation. The engine owns no store access
//! and holds no mutable state.

use tracing::debug;

use crate::error::Result;
use crate::fingerprint::fingerprint;
use crate::path::PathNormalizer;
use crate::reconcile::{normalize_path, reconcile, Reconciliation};
use datalith_core::{AssetFingerprint, SchemaField, StorageLocation};

/// Resolves the last-seen fingerprint for an asset, keyed by connector id
/// and normalized container-relative path.
///
/// Implemented by the caller over its relational store. Returning `None`
/// means no asset record exists for the key.
pub trait AssetLookup {
    /// Look up the stored fingerprint for `(connector_id, normalized_path)`.
    fn fingerprint_for(&self, connector_id: &str, normalized_path: &str)
        -> Option<AssetFingerprint>;
}

/// A single raw discovery event from the storage enumerator.
#[derive(Debug, Clone)]
pub struct DiscoveryEvent {
    /// Connector the blob was discovered through
    pub connector_id: String,
    /// Raw path or URL as enumerated
    pub raw_path: String,
    /// Optional storage-account hint for bare paths
    pub account_hint: Option<String>,
    /// Optional container hint for bare paths
    pub container_hint: Option<String>,
    /// Raw file bytes
    pub contents: Vec<u8>,
    /// Inferred schema, in declaration order
    pub schema: Vec<SchemaField>,
}

/// Result of processing one discovery event.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryOutcome {
    /// Canonical storage location
    pub location: StorageLocation,
    /// Fingerprint of the discovered file
    pub fingerprint: AssetFingerprint,
    /// Recommended store mutation
    pub reconciliation: Reconciliation,
}

/// Orchestrates normalize → fingerprint → reconcile for discovery events.
///
/// Safe to share across discovery workers: every method is a pure function
/// of its inputs plus the injected lookup. The caller must serialize the
/// read-decide-write sequence per `(connector_id, normalized path)` key —
/// two workers processing the same blob concurrently can otherwise both see
/// "no existing record" and both insert. A transactional upsert or row lock
/// around [`DiscoveryEngine::process`] plus the store write satisfies this.
#[derive(Debug)]
pub struct DiscoveryEngine<L> {
    normalizer: PathNormalizer,
    lookup: L,
}

impl<L: AssetLookup> DiscoveryEngine<L> {
    /// Create an engine over the caller's asset lookup.
    pub fn new(lookup: L) -> Self {
        Self {
            normalizer: PathNormalizer::new(),
            lookup,
        }
    }

    /// Process one discovery event into a mutation recommendation.
    ///
    /// # Errors
    ///
    /// Fails only when the raw path cannot be normalized; fingerprinting and
    /// reconciliation are total.
    pub fn process(&self, event: &DiscoveryEvent) -> Result<DiscoveryOutcome> {
        let location = self.normalizer.normalize(
            &event.raw_path,
            event.account_hint.as_deref(),
            event.container_hint.as_deref(),
        )?;

        let new_fingerprint = fingerprint(&event.contents, &event.schema);

        let key = normalize_path(&location.path);
        let existing = self.lookup.fingerprint_for(&event.connector_id, &key);
        debug!(
            connector_id = %event.connector_id,
            path = %key,
            found_existing = existing.is_some(),
            "resolved prior fingerprint"
        );

        let reconciliation = reconcile(existing.as_ref(), &new_fingerprint);

        Ok(DiscoveryOutcome {
            location,
            fingerprint: new_fingerprint,
            reconciliation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::AssetAction;
    use std::collections::HashMap;

    struct MapLookup(HashMap<(String, String), AssetFingerprint>);

    impl AssetLookup for MapLookup {
        fn fingerprint_for(
            &self,
            connector_id: &str,
            normalized_path: &str,
        ) -> Option<AssetFingerprint> {
            self.0
                .get(&(connector_id.to_string(), normalized_path.to_string()))
                .cloned()
        }
    }

    fn event() -> DiscoveryEvent {
        DiscoveryEvent {
            connector_id: "azure_blob_sales".to_string(),
            raw_path: "raw/sales/Orders.csv".to_string(),
            account_hint: None,
            container_hint: None,
            contents: b"id,amount\n1,10\n".to_vec(),
            schema: vec![
                SchemaField::new("id", "int64"),
                SchemaField::new("amount", "int64"),
            ],
        }
    }

    #[test]
    fn test_first_discovery_inserts() {
        let engine = DiscoveryEngine::new(MapLookup(HashMap::new()));
        let outcome = engine.process(&event()).unwrap();
        assert_eq!(outcome.reconciliation.action, AssetAction::Insert);
        assert_eq!(outcome.location.container, "raw");
    }

    #[test]
    fn test_rediscovery_with_same_fingerprint_skips() {
        let first = DiscoveryEngine::new(MapLookup(HashMap::new()))
            .process(&event())
            .unwrap();

        // Lookup keyed by the lowercased normalized path, as the store would be.
        let mut stored = HashMap::new();
        stored.insert(
            ("azure_blob_sales".to_string(), "sales/orders.csv".to_string()),
            first.fingerprint.clone(),
        );

        let outcome = DiscoveryEngine::new(MapLookup(stored))
            .process(&event())
            .unwrap();
        assert_eq!(outcome.reconciliation.action, AssetAction::Skip);
        assert!(!outcome.reconciliation.schema_changed);
    }

    #[test]
    fn test_schema_drift_updates() {
        let first = DiscoveryEngine::new(MapLookup(HashMap::new()))
            .process(&event())
            .unwrap();

        let mut stored = HashMap::new();
        stored.insert(
            ("azure_blob_sales".to_string(), "sales/orders.csv".to_string()),
            first.fingerprint.clone(),
        );

        let mut drifted = event();
        drifted.schema.push(SchemaField::new("region", "string"));
        let outcome = DiscoveryEngine::new(MapLookup(stored))
            .process(&drifted)
            .unwrap();
        assert_eq!(outcome.reconciliation.action, AssetAction::Update);
        assert!(outcome.reconciliation.schema_changed);
    }

    #[test]
    fn test_unrecognized_path_propagates() {
        let engine = DiscoveryEngine::new(MapLookup(HashMap::new()));
        let mut bad = event();
        bad.raw_path = "orders.csv".to_string();
        assert!(engine.process(&bad).is_err());
    }
}
