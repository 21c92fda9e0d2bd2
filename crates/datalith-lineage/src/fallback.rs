//! Regex fallback extraction.
//!
//! Used when the structured SQL parse is unavailable or fails: a best-effort
//! pattern search recovers target and source table names so an extraction
//! attempt always returns something usable. Column lineage is never produced
//! on this path.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::types::{ExtractionMethod, LineageExtraction, QueryType};

static INSERT_INTO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bINSERT\s+INTO\s+([A-Za-z_]\w*(?:\.\w+)*)").expect("valid pattern")
});

static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bCREATE\s+TABLE\s+([A-Za-z_]\w*(?:\.\w+)*)").expect("valid pattern")
});

static FROM_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bFROM\s+([A-Za-z_]\w*(?:\.\w+)*)").expect("valid pattern")
});

static JOIN_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bJOIN\s+([A-Za-z_]\w*(?:\.\w+)*)").expect("valid pattern")
});

/// Best-effort extraction by pattern search.
///
/// Confidence is 0.5 when at least one table name was recovered, 0.3
/// otherwise; the query type reflects a matched `INSERT INTO` or
/// `CREATE TABLE` target and stays `UNKNOWN` for everything else.
pub fn extract(sql: &str) -> LineageExtraction {
    let mut query_type = QueryType::Unknown;
    let mut target_table = None;

    if let Some(caps) = INSERT_INTO.captures(sql) {
        target_table = Some(caps[1].to_string());
        query_type = QueryType::Insert;
    }
    if let Some(caps) = CREATE_TABLE.captures(sql) {
        target_table = Some(caps[1].to_string());
        query_type = QueryType::Create;
    }

    let mut source_tables: Vec<String> = Vec::new();
    for caps in FROM_TABLE.captures_iter(sql).chain(JOIN_TABLE.captures_iter(sql)) {
        let table = caps[1].to_string();
        if !source_tables.contains(&table) {
            source_tables.push(table);
        }
    }

    let confidence_score = if target_table.is_some() || !source_tables.is_empty() {
        0.5
    } else {
        0.3
    };

    debug!(
        query_type = %query_type,
        source_tables = source_tables.len(),
        target = target_table.as_deref().unwrap_or("-"),
        confidence_score,
        "regex fallback extraction"
    );

    LineageExtraction {
        source_tables,
        target_table,
        column_lineage: Vec::new(),
        query_type,
        confidence_score,
        extraction_method: ExtractionMethod::RegexFallback,
    }
}
