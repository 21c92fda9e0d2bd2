//! Core types for lineage extraction and inference.
//!
//! These are the values the engine hands back to the external store: the
//! result of a SQL extraction or a fuzzy inference, and the persistence-ready
//! `lineage_relationships` candidate record built from either.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a lineage relationship was derived.
///
/// Callers treat this together with the confidence score as the trust
/// signal: deterministic SQL parsing outranks fuzzy inference, which
/// outranks the regex fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Structured SQL parse
    SqlParsing,
    /// Fuzzy column-name matching between two schemas
    FuzzyInference,
    /// Regex pattern search after a failed structured parse
    RegexFallback,
    /// Curated by a human
    Manual,
}

impl ExtractionMethod {
    /// Returns the string representation of this extraction method.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::SqlParsing => "sql_parsing",
            ExtractionMethod::FuzzyInference => "fuzzy_inference",
            ExtractionMethod::RegexFallback => "regex_fallback",
            ExtractionMethod::Manual => "manual",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sql_parsing" => Ok(ExtractionMethod::SqlParsing),
            "fuzzy_inference" => Ok(ExtractionMethod::FuzzyInference),
            "regex_fallback" => Ok(ExtractionMethod::RegexFallback),
            "manual" => Ok(ExtractionMethod::Manual),
            _ => Err(format!("unknown extraction method: {}", s)),
        }
    }
}

/// Statement classification assigned by the SQL extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    /// CREATE TABLE (optionally AS SELECT)
    Create,
    /// CREATE VIEW
    CreateView,
    /// INSERT (optionally ... SELECT)
    Insert,
    /// Bare SELECT, no target table
    Select,
    /// Unclassifiable; only produced by the fallback path
    Unknown,
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryType::Create => write!(f, "CREATE"),
            QueryType::CreateView => write!(f, "CREATE_VIEW"),
            QueryType::Insert => write!(f, "INSERT"),
            QueryType::Select => write!(f, "SELECT"),
            QueryType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// How a source column turns into a target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransformationKind {
    /// Value carried over unchanged
    #[default]
    PassThrough,
    /// Aggregate function applied (SUM, COUNT, ...)
    Aggregate,
    /// Same value under a different column name
    Rename,
}

impl TransformationKind {
    /// Returns the string representation of this transformation kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformationKind::PassThrough => "pass_through",
            TransformationKind::Aggregate => "aggregate",
            TransformationKind::Rename => "rename",
        }
    }
}

impl std::fmt::Display for TransformationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransformationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pass_through" => Ok(TransformationKind::PassThrough),
            "aggregate" => Ok(TransformationKind::Aggregate),
            "rename" => Ok(TransformationKind::Rename),
            _ => Err(format!("unknown transformation kind: {}", s)),
        }
    }
}

/// One column-to-column mapping within a lineage relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLineage {
    /// Source column name or expression text
    pub source_column: String,
    /// Target column name
    pub target_column: String,
    /// Transformation applied between the two
    pub transformation: TransformationKind,
    /// Similarity score when fuzzy-inferred; absent for SQL-derived entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ColumnLineage {
    /// Create a SQL-derived mapping (no per-pair confidence).
    pub fn new(
        source_column: impl Into<String>,
        target_column: impl Into<String>,
        transformation: TransformationKind,
    ) -> Self {
        Self {
            source_column: source_column.into(),
            target_column: target_column.into(),
            transformation,
            confidence: None,
        }
    }

    /// Create a fuzzy-inferred mapping carrying its similarity score.
    pub fn fuzzy(
        source_column: impl Into<String>,
        target_column: impl Into<String>,
        transformation: TransformationKind,
        similarity: f64,
    ) -> Self {
        Self {
            source_column: source_column.into(),
            target_column: target_column.into(),
            transformation,
            confidence: Some(similarity),
        }
    }
}

/// Result of extracting lineage from one SQL statement.
///
/// Always produced, never an error: when structured parsing fails the
/// extractor degrades to the regex fallback and the `extraction_method` /
/// `confidence_score` pair records how much to trust the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageExtraction {
    /// Tables read from, deduplicated in first-seen order
    pub source_tables: Vec<String>,
    /// Table written to, when the statement has one
    pub target_table: Option<String>,
    /// Column-level mappings; empty when positional pairing is ambiguous
    pub column_lineage: Vec<ColumnLineage>,
    /// Statement classification
    pub query_type: QueryType,
    /// Confidence in the extraction, in [0, 1]
    pub confidence_score: f64,
    /// How the result was derived
    pub extraction_method: ExtractionMethod,
}

/// Result of fuzzy column-lineage inference between two schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInference {
    /// Matched column pairs in source input order
    pub column_lineage: Vec<ColumnLineage>,
    /// Aggregate confidence over the matching, in [0, 1]
    pub confidence_score: f64,
}

impl ColumnInference {
    /// The zero-match result.
    pub fn empty() -> Self {
        Self {
            column_lineage: Vec::new(),
            confidence_score: 0.0,
        }
    }
}

/// Provenance tags passed through unmodified from the SQL source into the
/// resulting relationship record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Originating system (airflow, dbt, databricks, manual, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_system: Option<String>,
    /// ETL job or task id; part of the store's uniqueness key, so it must be
    /// supplied consistently across re-runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_job_id: Option<String>,
    /// Human-readable job name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_job_name: Option<String>,
}

/// A persistence-ready `lineage_relationships` candidate.
///
/// The store enforces uniqueness on `(source_asset_id, target_asset_id,
/// source_job_id)`; [`LineageRelationship::uniqueness_key`] exposes that
/// tuple so idempotent re-runs supersede rather than duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageRelationship {
    /// Asset the data flows from
    pub source_asset_id: String,
    /// Asset the data flows into
    pub target_asset_id: String,
    /// Relationship flavor; currently always "transformation"
    pub relationship_type: String,
    /// Column-level mappings
    pub column_lineage: Vec<ColumnLineage>,
    /// Original SQL text when the relationship came from a statement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    /// Pass-through provenance tags
    #[serde(flatten)]
    pub provenance: Provenance,
    /// Confidence in the relationship, in [0, 1]
    pub confidence_score: f64,
    /// How the relationship was derived
    pub extraction_method: ExtractionMethod,
    /// Caller-supplied discovery timestamp; the engine never reads a clock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovered_at: Option<DateTime<Utc>>,
}

impl LineageRelationship {
    /// Build a candidate from a SQL extraction, carrying the statement text.
    pub fn from_extraction(
        source_asset_id: impl Into<String>,
        target_asset_id: impl Into<String>,
        extraction: &LineageExtraction,
        sql_query: impl Into<String>,
        provenance: Provenance,
    ) -> Self {
        Self {
            source_asset_id: source_asset_id.into(),
            target_asset_id: target_asset_id.into(),
            relationship_type: "transformation".to_string(),
            column_lineage: extraction.column_lineage.clone(),
            sql_query: Some(sql_query.into()),
            provenance,
            confidence_score: extraction.confidence_score,
            extraction_method: extraction.extraction_method,
            discovered_at: None,
        }
    }

    /// Build a candidate from a fuzzy inference between two schemas.
    pub fn from_inference(
        source_asset_id: impl Into<String>,
        target_asset_id: impl Into<String>,
        inference: &ColumnInference,
        provenance: Provenance,
    ) -> Self {
        Self {
            source_asset_id: source_asset_id.into(),
            target_asset_id: target_asset_id.into(),
            relationship_type: "transformation".to_string(),
            column_lineage: inference.column_lineage.clone(),
            sql_query: None,
            provenance,
            confidence_score: inference.confidence_score,
            extraction_method: ExtractionMethod::FuzzyInference,
            discovered_at: None,
        }
    }

    /// Set the caller-supplied discovery timestamp.
    pub fn discovered_at(mut self, at: DateTime<Utc>) -> Self {
        self.discovered_at = Some(at);
        self
    }

    /// The tuple the store enforces uniqueness on.
    pub fn uniqueness_key(&self) -> (&str, &str, Option<&str>) {
        (
            &self.source_asset_id,
            &self.target_asset_id,
            self.provenance.source_job_id.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_method_round_trip() {
        for method in [
            ExtractionMethod::SqlParsing,
            ExtractionMethod::FuzzyInference,
            ExtractionMethod::RegexFallback,
            ExtractionMethod::Manual,
        ] {
            assert_eq!(method.to_string().parse::<ExtractionMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_transformation_kind_from_str_is_case_insensitive() {
        assert_eq!(
            "AGGREGATE".parse::<TransformationKind>().unwrap(),
            TransformationKind::Aggregate
        );
        assert!("join".parse::<TransformationKind>().is_err());
    }

    #[test]
    fn test_query_type_serialization() {
        let json = serde_json::to_string(&QueryType::CreateView).unwrap();
        assert_eq!(json, "\"CREATE_VIEW\"");
    }

    #[test]
    fn test_column_lineage_serialization_omits_absent_confidence() {
        let entry = ColumnLineage::new("amount", "total", TransformationKind::Aggregate);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("confidence"));
        assert!(json.contains("\"aggregate\""));
    }

    #[test]
    fn test_relationship_uniqueness_key() {
        let provenance = Provenance {
            source_system: Some("airflow".to_string()),
            source_job_id: Some("dag_42".to_string()),
            source_job_name: None,
        };
        let inference = ColumnInference::empty();
        let rel = LineageRelationship::from_inference("a-1", "a-2", &inference, provenance);
        assert_eq!(rel.uniqueness_key(), ("a-1", "a-2", Some("dag_42")));
        assert_eq!(rel.extraction_method, ExtractionMethod::FuzzyInference);
    }

    #[test]
    fn test_relationship_from_extraction_carries_sql() {
        let extraction = LineageExtraction {
            source_tables: vec!["sales".to_string()],
            target_table: Some("sales_summary".to_string()),
            column_lineage: vec![ColumnLineage::new(
                "region",
                "region",
                TransformationKind::PassThrough,
            )],
            query_type: QueryType::Insert,
            confidence_score: 0.9,
            extraction_method: ExtractionMethod::SqlParsing,
        };
        let rel = LineageRelationship::from_extraction(
            "asset-sales",
            "asset-summary",
            &extraction,
            "INSERT INTO sales_summary SELECT region FROM sales",
            Provenance::default(),
        );
        assert_eq!(rel.column_lineage.len(), 1);
        assert!(rel.sql_query.as_deref().unwrap().starts_with("INSERT"));
        assert_eq!(rel.uniqueness_key().2, None);
    }
}
