//! Datalith Core
//!
//! Shared data model for the Datalith discovery and lineage engine: storage
//! locations, schema fields, and asset fingerprints. These types are pure
//! values passed between the discovery and lineage crates and the external
//! store; no I/O happens here.

use serde::{Deserialize, Serialize};

/// Metadata for a single column in an inferred schema.
///
/// Schemas are ordered sequences of fields; the order is significant because
/// the schema hash is computed over the declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Column name
    pub name: String,
    /// Data type as reported by the schema inferrer (e.g. "string", "int64")
    pub data_type: String,
}

impl SchemaField {
    /// Create a new schema field.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// The kind of storage a location points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Hierarchical-namespace data lake (abfs/abfss URLs)
    DataLake,
    /// Flat blob storage (https blob URLs or bare container/path strings)
    Blob,
}

impl StorageKind {
    /// Returns the string representation of this storage kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::DataLake => "data_lake",
            StorageKind::Blob => "blob",
        }
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a connector must authenticate against the storage account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMethod {
    /// Principal-based auth. Mandatory for data-lake URLs.
    ServicePrincipal,
    /// Shared-key / connection-string auth for plain blob storage.
    ConnectionString,
}

impl std::fmt::Display for ConnectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionMethod::ServicePrincipal => write!(f, "service_principal"),
            ConnectionMethod::ConnectionString => write!(f, "connection_string"),
        }
    }
}

/// A normalized storage location, the canonical form of a raw path string.
///
/// Immutable once parsed. The `path` component never carries a leading or
/// trailing slash. Equality is case-insensitive across all string components
/// because dedup lookups compare locations discovered through differently
/// cased URLs; use [`StorageLocation::dedup_key`] when a hashable key is
/// needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageLocation {
    /// Storage flavor this location was parsed as
    pub kind: StorageKind,
    /// Storage account name
    pub account: String,
    /// Container (blob) or filesystem (data lake) name
    pub container: String,
    /// Path within the container, no surrounding slashes
    pub path: String,
    /// Original protocol (abfs, abfss, https)
    pub protocol: String,
}

impl StorageLocation {
    /// The connection method this location's storage flavor requires.
    ///
    /// Data-lake URLs mandate principal-based auth, never a shared key.
    pub fn connection_method(&self) -> ConnectionMethod {
        match self.kind {
            StorageKind::DataLake => ConnectionMethod::ServicePrincipal,
            StorageKind::Blob => ConnectionMethod::ConnectionString,
        }
    }

    /// Reconstruct the canonical URL for this location.
    ///
    /// Re-normalizing the returned string yields an equal location.
    pub fn full_url(&self) -> String {
        match self.kind {
            StorageKind::DataLake => format!(
                "{}://{}@{}.dfs.core.windows.net/{}",
                self.protocol, self.container, self.account, self.path
            ),
            StorageKind::Blob => format!(
                "https://{}.blob.core.windows.net/{}/{}",
                self.account, self.container, self.path
            ),
        }
    }

    /// Lowercase `account/container/path` string used as the dedup key for
    /// store lookups.
    pub fn dedup_key(&self) -> String {
        format!("{}/{}/{}", self.account, self.container, self.path).to_lowercase()
    }
}

impl PartialEq for StorageLocation {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.account.eq_ignore_ascii_case(&other.account)
            && self.container.eq_ignore_ascii_case(&other.container)
            && self.path.eq_ignore_ascii_case(&other.path)
            && self.protocol.eq_ignore_ascii_case(&other.protocol)
    }
}

impl Eq for StorageLocation {}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_url())
    }
}

/// Paired content/schema digest summarizing an asset's current state.
///
/// `content_hash` identifies byte-identical file content; `schema_hash`
/// identifies the column-name/type structure. Two fingerprints with equal
/// `schema_hash` but different `content_hash` represent the same logical
/// table shape holding new data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFingerprint {
    /// Hex SHA-256 digest over the raw file bytes
    pub content_hash: String,
    /// Hex SHA-256 digest over the canonical schema serialization
    pub schema_hash: String,
}

impl AssetFingerprint {
    /// Create a fingerprint from precomputed digests.
    pub fn new(content_hash: impl Into<String>, schema_hash: impl Into<String>) -> Self {
        Self {
            content_hash: content_hash.into(),
            schema_hash: schema_hash.into(),
        }
    }

    /// True if the other fingerprint shares this schema hash.
    pub fn same_schema(&self, other: &AssetFingerprint) -> bool {
        self.schema_hash == other.schema_hash
    }

    /// True if the other fingerprint shares this content hash.
    pub fn same_content(&self, other: &AssetFingerprint) -> bool {
        self.content_hash == other.content_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lake_location() -> StorageLocation {
        StorageLocation {
            kind: StorageKind::DataLake,
            account: "lakehouse1".to_string(),
            container: "lh-enriched".to_string(),
            path: "visionplus/ATH3".to_string(),
            protocol: "abfs".to_string(),
        }
    }

    #[test]
    fn test_full_url_data_lake() {
        assert_eq!(
            lake_location().full_url(),
            "abfs://lh-enriched@lakehouse1.dfs.core.windows.net/visionplus/ATH3"
        );
    }

    #[test]
    fn test_full_url_blob() {
        let loc = StorageLocation {
            kind: StorageKind::Blob,
            account: "prodstore".to_string(),
            container: "raw".to_string(),
            path: "sales/2024/orders.csv".to_string(),
            protocol: "https".to_string(),
        };
        assert_eq!(
            loc.full_url(),
            "https://prodstore.blob.core.windows.net/raw/sales/2024/orders.csv"
        );
    }

    #[test]
    fn test_equality_is_case_insensitive() {
        let a = lake_location();
        let mut b = lake_location();
        b.path = "VisionPlus/ath3".to_string();
        b.account = "LAKEHOUSE1".to_string();
        assert_eq!(a, b);
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_connection_method() {
        assert_eq!(
            lake_location().connection_method(),
            ConnectionMethod::ServicePrincipal
        );
        let blob = StorageLocation {
            kind: StorageKind::Blob,
            ..lake_location()
        };
        assert_eq!(blob.connection_method(), ConnectionMethod::ConnectionString);
    }

    #[test]
    fn test_fingerprint_comparisons() {
        let a = AssetFingerprint::new("c1", "s1");
        let b = AssetFingerprint::new("c2", "s1");
        assert!(a.same_schema(&b));
        assert!(!a.same_content(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_location_serialization() {
        let loc = lake_location();
        let json = serde_json::to_string(&loc).unwrap();
        let parsed: StorageLocation = serde_json::from_str(&json).unwrap();
        assert_eq!(loc, parsed);
        assert!(json.contains("\"data_lake\""));
    }
}
