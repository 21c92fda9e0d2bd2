//! Error types for asset discovery.

use thiserror::Error;

/// Errors that can occur during discovery reconciliation.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No registered matcher accepted the path and no hint pair was supplied
    #[error("unrecognized storage path format: {0}")]
    UnrecognizedPath(String),

    /// Path was empty after trimming
    #[error("storage path cannot be empty")]
    EmptyPath,
}

/// A specialized Result type for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
