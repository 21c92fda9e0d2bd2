//! Asset discovery reconciliation for the Datalith catalog.
//!
//! This crate decides what to do with a freshly discovered object-storage
//! asset: normalize its raw path into a canonical [`StorageLocation`],
//! fingerprint its content and schema, and compare against the previously
//! stored fingerprint to recommend an insert, update, or skip.
//!
//! All components are pure, synchronous computation over in-memory inputs.
//! The relational store stays external: lookups come in through the
//! [`AssetLookup`] trait and the recommended mutation goes back out as a
//! [`Reconciliation`] for the caller to execute atomically.
//!
//! # Example
//!
//! ```
//! use datalith_core::SchemaField;
//! use datalith_discovery::{fingerprint, reconcile, AssetAction};
//!
//! let schema = vec![SchemaField::new("id", "int64")];
//! let fresh = fingerprint(b"id\n1\n", &schema);
//!
//! // First sighting: nothing stored yet.
//! let decision = reconcile(None, &fresh);
//! assert_eq!(decision.action, AssetAction::Insert);
//!
//! // Content-only drift is deliberately skipped.
//! let refreshed = fingerprint(b"id\n2\n", &schema);
//! let decision = reconcile(Some(&fresh), &refreshed);
//! assert_eq!(decision.action, AssetAction::Skip);
//! ```

mod engine;
mod error;
mod fingerprint;
mod path;
mod reconcile;

pub use engine::{AssetLookup, DiscoveryEngine, DiscoveryEvent, DiscoveryOutcome};
pub use error::{DiscoveryError, Result};
pub use fingerprint::{content_hash, fingerprint, schema_hash};
pub use path::{normalize_storage_path, PathNormalizer};
pub use reconcile::{normalize_path, reconcile, AssetAction, Reconciliation};
