//! Asset reconciliation.
//!
//! Decides whether a freshly discovered asset should be inserted, updated,
//! or skipped relative to the previously stored fingerprint. This is a pure
//! decision function: the caller resolves the existing fingerprint by
//! querying the store with `(connector_id, normalized path)` and executes
//! the recommended action atomically.

use serde::{Deserialize, Serialize};
use tracing::info;

use datalith_core::AssetFingerprint;

/// Recommended store mutation for a discovered asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetAction {
    /// No prior record; create one
    Insert,
    /// Schema drifted; refresh the full record
    Update,
    /// Nothing to do
    Skip,
}

impl std::fmt::Display for AssetAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetAction::Insert => write!(f, "insert"),
            AssetAction::Update => write!(f, "update"),
            AssetAction::Skip => write!(f, "skip"),
        }
    }
}

/// Outcome of comparing a new fingerprint against the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The mutation the caller should execute
    pub action: AssetAction,
    /// Whether the schema hash differed from the stored fingerprint
    pub schema_changed: bool,
}

/// Normalize a storage path string for dedup comparison.
///
/// Surrounding slashes are stripped and the result is lowercased; internal
/// separators are preserved. Lookup of an existing asset is by exact string
/// equality on this normalized form.
pub fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_lowercase()
}

/// Compare the stored fingerprint (if any) against the newly computed one.
///
/// Policy:
/// - no existing fingerprint: `Insert`
/// - schema hash differs: `Update` with `schema_changed = true`; schema
///   drift always forces a full metadata refresh regardless of the content
///   hash
/// - schema equal, content differs: `Skip`. A content-only change does not
///   rewrite the asset record; lineage and business metadata are
///   schema-scoped and expensive to recompute, so pure data refreshes are
///   deliberately left alone. Operational metadata (row counts) can go
///   stale under this rule; callers needing freshness must refresh it out
///   of band.
/// - both equal: `Skip`
///
/// Total over its inputs. Correctness under concurrent discovery of the
/// same `(connector_id, path)` key requires the caller to serialize the
/// read-decide-write sequence (row lock or upsert with a unique constraint);
/// this function holds no state and provides no locking.
pub fn reconcile(
    existing: Option<&AssetFingerprint>,
    new: &AssetFingerprint,
) -> Reconciliation {
    let Some(existing) = existing else {
        return Reconciliation {
            action: AssetAction::Insert,
            schema_changed: false,
        };
    };

    let schema_changed = !existing.same_schema(new);
    let content_changed = !existing.same_content(new);

    let action = if schema_changed {
        AssetAction::Update
    } else {
        AssetAction::Skip
    };

    info!(
        %action,
        schema_changed,
        content_changed,
        "reconciled discovered asset"
    );

    Reconciliation {
        action,
        schema_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(content: &str, schema: &str) -> AssetFingerprint {
        AssetFingerprint::new(content, schema)
    }

    #[test]
    fn test_no_existing_inserts() {
        let r = reconcile(None, &fp("c1", "s1"));
        assert_eq!(r.action, AssetAction::Insert);
        assert!(!r.schema_changed);
    }

    #[test]
    fn test_schema_drift_updates() {
        let r = reconcile(Some(&fp("c1", "s1")), &fp("c1", "s2"));
        assert_eq!(r.action, AssetAction::Update);
        assert!(r.schema_changed);
    }

    #[test]
    fn test_schema_drift_updates_even_with_content_change() {
        let r = reconcile(Some(&fp("c1", "s1")), &fp("c2", "s2"));
        assert_eq!(r.action, AssetAction::Update);
        assert!(r.schema_changed);
    }

    #[test]
    fn test_content_only_change_skips() {
        let r = reconcile(Some(&fp("c1", "s1")), &fp("c2", "s1"));
        assert_eq!(r.action, AssetAction::Skip);
        assert!(!r.schema_changed);
    }

    #[test]
    fn test_identical_fingerprints_skip() {
        let r = reconcile(Some(&fp("c1", "s1")), &fp("c1", "s1"));
        assert_eq!(r.action, AssetAction::Skip);
        assert!(!r.schema_changed);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/Sales/2024/Orders.csv/"), "sales/2024/orders.csv");
        assert_eq!(normalize_path("plain"), "plain");
        assert_eq!(normalize_path(""), "");
    }
}
