//! Content and schema fingerprinting.
//!
//! Computes the paired digests the reconciler compares: a content hash over
//! the raw file bytes and a schema hash over the canonical serialization of
//! the inferred schema. Both are SHA-256 hex digests. Pure functions, no I/O.

use sha2::{Digest, Sha256};

use datalith_core::{AssetFingerprint, SchemaField};

/// Compute the fingerprint for a discovered file.
///
/// The schema hash is taken over `name:data_type` lines in declaration
/// order, so the same schema always yields the same digest and a content
/// change alone never perturbs it.
pub fn fingerprint(contents: &[u8], schema: &[SchemaField]) -> AssetFingerprint {
    AssetFingerprint {
        content_hash: content_hash(contents),
        schema_hash: schema_hash(schema),
    }
}

/// Hex SHA-256 digest over raw file bytes.
pub fn content_hash(contents: &[u8]) -> String {
    hex::encode(Sha256::digest(contents))
}

/// Hex SHA-256 digest over the canonical schema serialization.
pub fn schema_hash(schema: &[SchemaField]) -> String {
    let mut hasher = Sha256::new();
    for field in schema {
        hasher.update(field.name.as_bytes());
        hasher.update(b":");
        hasher.update(field.data_type.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Vec<SchemaField> {
        vec![
            SchemaField::new("customer_id", "int64"),
            SchemaField::new("order_date", "date"),
        ]
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint(b"id,name\n1,alpha\n", &sample_schema());
        let b = fingerprint(b"id,name\n1,alpha\n", &sample_schema());
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_change_leaves_schema_hash_alone() {
        let a = fingerprint(b"id,name\n1,alpha\n", &sample_schema());
        let b = fingerprint(b"id,name\n2,beta\n", &sample_schema());
        assert_ne!(a.content_hash, b.content_hash);
        assert_eq!(a.schema_hash, b.schema_hash);
    }

    #[test]
    fn test_schema_change_leaves_content_hash_alone() {
        let changed = vec![
            SchemaField::new("customer_id", "string"),
            SchemaField::new("order_date", "date"),
        ];
        let a = fingerprint(b"same bytes", &sample_schema());
        let b = fingerprint(b"same bytes", &changed);
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.schema_hash, b.schema_hash);
    }

    #[test]
    fn test_schema_hash_is_order_sensitive() {
        let reversed: Vec<SchemaField> = sample_schema().into_iter().rev().collect();
        assert_ne!(schema_hash(&sample_schema()), schema_hash(&reversed));
    }

    #[test]
    fn test_digests_are_hex_sha256() {
        let fp = fingerprint(b"", &[]);
        assert_eq!(fp.content_hash.len(), 64);
        assert_eq!(fp.schema_hash.len(), 64);
        // SHA-256 of the empty byte string
        assert_eq!(
            fp.content_hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
