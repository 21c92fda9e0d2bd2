//! Error types for lineage extraction.
//!
//! These errors are internal to the structured parsing path: the public
//! [`extract`](crate::SqlLineageExtractor::extract) API never surfaces them,
//! converting every failure into a lower-confidence regex-fallback result
//! instead.

use thiserror::Error;

/// Failures inside the structured SQL parsing path.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// SQL parsing failed
    #[error("SQL parsing failed: {0}")]
    Parse(String),

    /// Statement kind carries no lineage signal (UPDATE, DELETE, GRANT, ...)
    #[error("unsupported SQL statement: {0}")]
    UnsupportedStatement(String),

    /// Empty query
    #[error("empty SQL query")]
    EmptyQuery,
}

impl From<sqlparser::parser::ParserError> for ExtractError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        ExtractError::Parse(err.to_string())
    }
}

/// A specialized Result type for the structured parsing path.
pub type Result<T> = std::result::Result<T, ExtractError>;
