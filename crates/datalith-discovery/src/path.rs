//! Storage path normalization.
//!
//! Turns raw storage path/URL strings into canonical [`StorageLocation`]
//! values used as dedup keys. Two formats are recognized, tried most-specific
//! first:
//!
//! 1. Data-lake hierarchical-namespace URLs:
//!    `abfs://container@account.dfs.core.windows.net/path` (also `abfss`).
//!    This format mandates principal-based authentication.
//! 2. Blob URLs (`https://account.blob.core.windows.net/container/path`) and
//!    bare `container/path` strings.
//!
//! The matcher set is closed and evaluated in fixed priority order; the
//! first matcher whose predicate accepts the input and whose parse succeeds
//! wins. When nothing matches but the caller supplied both an account and a
//! container hint, a best-effort location is constructed from the hints with
//! the raw string as the path.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{DiscoveryError, Result};
use datalith_core::{StorageKind, StorageLocation};

static DATA_LAKE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(abfs|abfss)://([^@]+)@([^.]+)\.dfs\.core\.windows\.net(.*)$")
        .expect("data lake URL pattern is valid")
});

static BLOB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https://([^.]+)\.blob\.core\.windows\.net/([^/]+)(.*)$")
        .expect("blob URL pattern is valid")
});

const KNOWN_SCHEMES: [&str; 6] = ["http://", "https://", "abfs://", "abfss://", "s3://", "gs://"];

/// The closed set of path matchers, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathMatcher {
    /// `abfs[s]://container@account.dfs.core.windows.net/path`
    DataLakeUrl,
    /// Blob URL or bare `container/path` string
    BlobPath,
}

impl PathMatcher {
    fn accepts(&self, path: &str) -> bool {
        match self {
            PathMatcher::DataLakeUrl => DATA_LAKE_URL.is_match(path),
            PathMatcher::BlobPath => {
                if BLOB_URL.is_match(path) {
                    return true;
                }
                // Bare container/path form: a separator and no recognized scheme.
                let lower = path.to_lowercase();
                path.contains('/') && !KNOWN_SCHEMES.iter().any(|s| lower.starts_with(s))
            }
        }
    }

    fn parse(
        &self,
        path: &str,
        account_hint: Option<&str>,
        container_hint: Option<&str>,
    ) -> Result<StorageLocation> {
        match self {
            PathMatcher::DataLakeUrl => parse_data_lake_url(path),
            PathMatcher::BlobPath => parse_blob_path(path, account_hint, container_hint),
        }
    }
}

fn parse_data_lake_url(path: &str) -> Result<StorageLocation> {
    let caps = DATA_LAKE_URL
        .captures(path)
        .ok_or_else(|| DiscoveryError::UnrecognizedPath(path.to_string()))?;

    Ok(StorageLocation {
        kind: StorageKind::DataLake,
        protocol: caps[1].to_lowercase(),
        container: caps[2].to_string(),
        account: caps[3].to_string(),
        path: caps[4].trim_start_matches('/').trim_end_matches('/').to_string(),
    })
}

fn parse_blob_path(
    path: &str,
    account_hint: Option<&str>,
    container_hint: Option<&str>,
) -> Result<StorageLocation> {
    if let Some(caps) = BLOB_URL.captures(path) {
        return Ok(StorageLocation {
            kind: StorageKind::Blob,
            account: caps[1].to_string(),
            container: caps[2].to_string(),
            path: caps[3].trim_start_matches('/').trim_end_matches('/').to_string(),
            protocol: "https".to_string(),
        });
    }

    // Bare form. With both hints the whole string is relative to the hinted
    // container; otherwise the first separator splits container from path.
    let (account, container, file_path) = match (account_hint, container_hint) {
        (Some(account), Some(container)) => {
            (account.to_string(), container.to_string(), path.to_string())
        }
        _ => match path.split_once('/') {
            Some((container, rest)) => (
                account_hint.unwrap_or("unknown").to_string(),
                container.to_string(),
                rest.to_string(),
            ),
            None => return Err(DiscoveryError::UnrecognizedPath(path.to_string())),
        },
    };

    Ok(StorageLocation {
        kind: StorageKind::Blob,
        account,
        container,
        path: file_path.trim_matches('/').to_string(),
        protocol: "https".to_string(),
    })
}

/// Normalizes raw storage paths through the ordered matcher set.
///
/// Stateless; construct once and share freely across discovery workers.
#[derive(Debug, Default)]
pub struct PathNormalizer {
    _private: (),
}

impl PathNormalizer {
    /// Create a normalizer with the default matcher order.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Normalize a raw path/URL into a canonical [`StorageLocation`].
    ///
    /// `account_hint` and `container_hint` are used by the bare-path form and
    /// by the last-resort fallback when no matcher accepts the input.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::UnrecognizedPath`] if no matcher accepts the
    /// input and no hint pair was supplied, and [`DiscoveryError::EmptyPath`]
    /// for empty input.
    pub fn normalize(
        &self,
        raw_path: &str,
        account_hint: Option<&str>,
        container_hint: Option<&str>,
    ) -> Result<StorageLocation> {
        let raw_path = raw_path.trim();
        if raw_path.is_empty() {
            return Err(DiscoveryError::EmptyPath);
        }

        for matcher in [PathMatcher::DataLakeUrl, PathMatcher::BlobPath] {
            if !matcher.accepts(raw_path) {
                continue;
            }
            match matcher.parse(raw_path, account_hint, container_hint) {
                Ok(location) => {
                    debug!(
                        matcher = ?matcher,
                        kind = %location.kind,
                        "normalized storage path"
                    );
                    return Ok(location);
                }
                // A matcher that accepted but failed to parse falls through
                // to the next matcher.
                Err(_) => continue,
            }
        }

        // Best-effort fallback: with both hints present the raw string is
        // treated as a container-relative path rather than failing.
        if let (Some(account), Some(container)) = (account_hint, container_hint) {
            debug!(account, container, "constructed location from hints");
            return Ok(StorageLocation {
                kind: StorageKind::Blob,
                account: account.to_string(),
                container: container.to_string(),
                path: raw_path.trim_matches('/').to_string(),
                protocol: "https".to_string(),
            });
        }

        Err(DiscoveryError::UnrecognizedPath(raw_path.to_string()))
    }
}

/// Convenience wrapper around a default [`PathNormalizer`].
pub fn normalize_storage_path(
    raw_path: &str,
    account_hint: Option<&str>,
    container_hint: Option<&str>,
) -> Result<StorageLocation> {
    PathNormalizer::new().normalize(raw_path, account_hint, container_hint)
}
