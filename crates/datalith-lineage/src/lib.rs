//! Data lineage extraction and inference for the Datalith catalog.
//!
//! Two ways of establishing a source→target relationship between assets:
//!
//! - **SQL extraction** ([`SqlLineageExtractor`]): parse a statement into
//!   source tables, a target table, and column-level mappings. Structured
//!   parsing is attempted first; any failure degrades to a regex fallback so
//!   the extractor never errors, and the `extraction_method` plus
//!   `confidence_score` on the result record how it was derived.
//! - **Fuzzy inference** ([`infer_column_lineage`]): when no SQL is
//!   available, match two schemas' column names by similarity and score the
//!   matching as a whole.
//!
//! Either result feeds [`LineageRelationship`], the persistence-ready
//! candidate the external store inserts or supersedes under its
//! `(source_asset_id, target_asset_id, source_job_id)` uniqueness key.
//!
//! # Example
//!
//! ```
//! use datalith_lineage::{ExtractionMethod, QueryType, SqlLineageExtractor};
//!
//! let extractor = SqlLineageExtractor::new();
//! let result = extractor.extract(
//!     "INSERT INTO sales_summary (total, region) \
//!      SELECT SUM(amount), region FROM sales GROUP BY region",
//!     "mysql",
//! );
//!
//! assert_eq!(result.query_type, QueryType::Insert);
//! assert_eq!(result.target_table.as_deref(), Some("sales_summary"));
//! assert_eq!(result.source_tables, vec!["sales"]);
//! assert_eq!(result.extraction_method, ExtractionMethod::SqlParsing);
//! assert_eq!(result.column_lineage.len(), 2);
//! ```
//!
//! Low-confidence results (regex fallback, sparse fuzzy matches) are meant
//! to be surfaced for human review rather than auto-applied; enforcing that
//! gate is caller policy.

mod error;
mod extractor;
mod fallback;
mod infer;
mod types;

pub use error::{ExtractError, Result};
pub use extractor::SqlLineageExtractor;
pub use infer::{
    detect_transformation, infer_column_lineage, match_columns, DEFAULT_MATCH_THRESHOLD,
    DEFAULT_MIN_MATCH_RATIO, INFERENCE_MATCH_THRESHOLD,
};
pub use types::{
    ColumnInference, ColumnLineage, ExtractionMethod, LineageExtraction, LineageRelationship,
    Provenance, QueryType, TransformationKind,
};
