//! Fuzzy column-lineage inference.
//!
//! When no SQL statement ties two assets together, column-level lineage is
//! inferred from their schemas alone: each source column is matched against
//! the target columns by name similarity, and the matching as a whole is
//! scored so callers can decide how much to trust it.
//!
//! Matching is greedy in source input order and each target column is
//! consumed at most once. Ties break toward the first-encountered target.
//! This is deliberately not an assignment-optimal algorithm; swapping in one
//! would shift the confidence-score distribution for every caller.

use tracing::info;

use crate::types::{ColumnInference, ColumnLineage, TransformationKind};
use datalith_core::SchemaField;

/// Match threshold for general-purpose column comparison.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.8;

/// Threshold used internally by lineage inference. Lower than the default:
/// recall is preferred over precision here because results carry their own
/// confidence score for downstream review.
pub const INFERENCE_MATCH_THRESHOLD: f64 = 0.6;

/// Default minimum match ratio for the coverage bonus.
pub const DEFAULT_MIN_MATCH_RATIO: f64 = 0.3;

/// Table-role prefixes stripped before the cleaned-name comparison.
const ROLE_PREFIXES: [&str; 6] = ["tbl_", "dim_", "fact_", "stg_", "raw_", "src_"];

/// Key suffixes stripped before the cleaned-name comparison.
const KEY_SUFFIXES: [&str; 4] = ["_id", "_key", "_pk", "_fk"];

/// Aggregation markers recognized in target column names.
const AGGREGATION_MARKERS: [&str; 6] = ["sum_", "avg_", "count_", "max_", "min_", "total_"];

/// Fuzzy-match two column names.
///
/// Scoring precedence, first rule that decides wins:
/// 1. case-insensitive exact match after trimming: 1.0
/// 2. equal after stripping `_`, `-`, and whitespace: 0.95
/// 3. normalized edit similarity, floored at 0.85 when one stripped name is
///    a substring of the other, and at 0.9 when the names are equal after
///    stripping table-role prefixes and key suffixes
///
/// Returns `(is_match, score)` with `is_match = score >= threshold`.
pub fn match_columns(a: &str, b: &str, threshold: f64) -> (bool, f64) {
    let a_lower = a.trim().to_lowercase();
    let b_lower = b.trim().to_lowercase();
    if a_lower.is_empty() || b_lower.is_empty() {
        return (false, 0.0);
    }

    if a_lower == b_lower {
        return (true, 1.0);
    }

    let a_stripped = strip_separators(&a_lower);
    let b_stripped = strip_separators(&b_lower);
    if a_stripped == b_stripped {
        return (true, 0.95);
    }

    let mut similarity = strsim::normalized_levenshtein(&a_lower, &b_lower);

    // Substring after separator stripping, e.g. "user_id" vs "userid".
    if !a_stripped.is_empty()
        && !b_stripped.is_empty()
        && (a_stripped.contains(&b_stripped) || b_stripped.contains(&a_stripped))
    {
        similarity = similarity.max(0.85);
    }

    // Same name once table-role prefixes and key suffixes are removed,
    // e.g. "dim_customer" vs "customer_id".
    if strip_role_markers(&a_lower) == strip_role_markers(&b_lower) {
        similarity = similarity.max(0.9);
    }

    (similarity >= threshold, similarity)
}

/// Infer column-level lineage between two schemas.
///
/// Greedy bipartite matching: source columns are visited in input order,
/// each taking its highest-scoring unconsumed target at or above the
/// internal 0.6 threshold. Unmatched columns produce no entry.
///
/// The aggregate confidence is `0.6 * match_ratio + 0.4 * avg_score` with
/// `match_ratio = matches / max(|source|, |target|)`, plus a flat 0.1 bonus
/// capped at 0.95 when the ratio reaches `min_match_ratio`. Zero matches
/// yield an empty result at confidence 0.0.
pub fn infer_column_lineage(
    source_columns: &[SchemaField],
    target_columns: &[SchemaField],
    min_match_ratio: f64,
) -> ColumnInference {
    let source_names: Vec<&str> = source_columns
        .iter()
        .map(|f| f.name.as_str())
        .filter(|n| !n.is_empty())
        .collect();
    let target_names: Vec<&str> = target_columns
        .iter()
        .map(|f| f.name.as_str())
        .filter(|n| !n.is_empty())
        .collect();

    if source_names.is_empty() || target_names.is_empty() {
        return ColumnInference::empty();
    }

    let mut column_lineage = Vec::new();
    let mut consumed = vec![false; target_names.len()];
    let mut total_similarity = 0.0;

    for source in &source_names {
        let mut best: Option<(usize, f64)> = None;
        for (idx, target) in target_names.iter().enumerate() {
            if consumed[idx] {
                continue;
            }
            let (is_match, score) = match_columns(source, target, INFERENCE_MATCH_THRESHOLD);
            if is_match && best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((idx, score));
            }
        }

        if let Some((idx, score)) = best {
            let target = target_names[idx];
            column_lineage.push(ColumnLineage::fuzzy(
                *source,
                target,
                detect_transformation(source, target),
                score,
            ));
            consumed[idx] = true;
            total_similarity += score;
        }
    }

    let match_count = column_lineage.len();
    if match_count == 0 {
        return ColumnInference::empty();
    }

    let avg_similarity = total_similarity / match_count as f64;
    let match_ratio = match_count as f64 / source_names.len().max(target_names.len()) as f64;

    let mut confidence = 0.6 * match_ratio + 0.4 * avg_similarity;
    if match_ratio >= min_match_ratio {
        confidence = (confidence + 0.1).min(0.95);
    }

    info!(
        source_columns = source_names.len(),
        target_columns = target_names.len(),
        matches = match_count,
        confidence,
        "inferred column lineage"
    );

    ColumnInference {
        column_lineage,
        confidence_score: confidence,
    }
}

/// Classify the transformation between a matched column pair.
///
/// A target name carrying an aggregation marker whose removal yields the
/// source name is an aggregate; otherwise differing names with similarity
/// above 0.7 count as a rename, and everything else passes through.
pub fn detect_transformation(source: &str, target: &str) -> TransformationKind {
    let source_lower = source.to_lowercase();
    let target_lower = target.to_lowercase();

    if AGGREGATION_MARKERS.iter().any(|m| target_lower.contains(m)) {
        let stripped = AGGREGATION_MARKERS
            .iter()
            .fold(target_lower.clone(), |acc, m| acc.replace(m, ""));
        if target_lower.contains(&source_lower) || stripped == source_lower {
            return TransformationKind::Aggregate;
        }
    }

    if source_lower != target_lower
        && strsim::normalized_levenshtein(&source_lower, &target_lower) > 0.7
    {
        return TransformationKind::Rename;
    }

    TransformationKind::PassThrough
}

fn strip_separators(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
        .collect()
}

fn strip_role_markers(name: &str) -> String {
    let mut cleaned = name.to_string();
    for prefix in ROLE_PREFIXES {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest.to_string();
        }
    }
    for suffix in KEY_SUFFIXES {
        if let Some(rest) = cleaned.strip_suffix(suffix) {
            cleaned = rest.to_string();
        }
    }
    cleaned
}
