//! Structured SQL lineage extraction.
//!
//! Parses a SQL statement into source tables, a target table, and
//! column-level mappings, with a confidence score reflecting the statement
//! class. The public entry point is total: any failure inside the
//! structured path degrades to the regex fallback instead of surfacing an
//! error, so an extraction attempt always yields a usable result.

use sqlparser::ast::{
    Expr, Ident, Query, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins,
};
use sqlparser::dialect::{dialect_from_str, GenericDialect};
use sqlparser::parser::Parser;
use tracing::{info, warn};

use crate::error::{ExtractError, Result};
use crate::fallback;
use crate::types::{
    ColumnLineage, ExtractionMethod, LineageExtraction, QueryType, TransformationKind,
};

/// SQL lineage extractor.
///
/// Stateless; construct once at process start and share by reference.
#[derive(Debug, Default)]
pub struct SqlLineageExtractor {
    _private: (),
}

impl SqlLineageExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Extract lineage from a SQL statement under the given dialect tag
    /// (`mysql`, `postgres`, `bigquery`, ...; unknown tags fall back to the
    /// generic dialect).
    ///
    /// Never fails: parse errors and unsupported statement kinds degrade to
    /// the regex fallback with a reduced confidence score.
    pub fn extract(&self, sql: &str, dialect: &str) -> LineageExtraction {
        let sql = sql.trim();
        match self.try_parse(sql, dialect) {
            Ok(extraction) => {
                info!(
                    query_type = %extraction.query_type,
                    source_tables = extraction.source_tables.len(),
                    target = extraction.target_table.as_deref().unwrap_or("-"),
                    confidence = extraction.confidence_score,
                    "extracted lineage from SQL"
                );
                extraction
            }
            Err(err) => {
                warn!(error = %err, "structured SQL parse failed, degrading to regex fallback");
                fallback::extract(sql)
            }
        }
    }

    fn try_parse(&self, sql: &str, dialect_tag: &str) -> Result<LineageExtraction> {
        if sql.is_empty() {
            return Err(ExtractError::EmptyQuery);
        }

        let dialect = dialect_from_str(dialect_tag).unwrap_or_else(|| Box::new(GenericDialect {}));
        let statements = Parser::parse_sql(dialect.as_ref(), sql)?;
        let stmt = statements.first().ok_or(ExtractError::EmptyQuery)?;

        match stmt {
            Statement::Query(query) => {
                let mut source_tables = Vec::new();
                self.collect_query_sources(query, &mut source_tables);
                Ok(LineageExtraction {
                    source_tables,
                    target_table: None,
                    column_lineage: Vec::new(),
                    query_type: QueryType::Select,
                    // No target table: weaker lineage signal than DDL/DML.
                    confidence_score: 0.7,
                    extraction_method: ExtractionMethod::SqlParsing,
                })
            }
            Statement::Insert(insert) => {
                let target_table = insert.table.to_string();
                let mut source_tables = Vec::new();
                let mut column_lineage = Vec::new();
                if let Some(source) = &insert.source {
                    self.collect_query_sources(source, &mut source_tables);
                    column_lineage = self.insert_positional_lineage(&insert.columns, source);
                }
                Ok(LineageExtraction {
                    source_tables,
                    target_table: Some(target_table),
                    column_lineage,
                    query_type: QueryType::Insert,
                    confidence_score: 0.9,
                    extraction_method: ExtractionMethod::SqlParsing,
                })
            }
            Statement::CreateTable(create) => {
                let mut source_tables = Vec::new();
                let mut column_lineage = Vec::new();
                if let Some(query) = &create.query {
                    self.collect_query_sources(query, &mut source_tables);
                    column_lineage = self.projection_lineage(query);
                }
                Ok(LineageExtraction {
                    source_tables,
                    target_table: Some(create.name.to_string()),
                    column_lineage,
                    query_type: QueryType::Create,
                    confidence_score: 0.9,
                    extraction_method: ExtractionMethod::SqlParsing,
                })
            }
            Statement::CreateView { name, query, .. } => {
                let mut source_tables = Vec::new();
                self.collect_query_sources(query, &mut source_tables);
                let column_lineage = self.projection_lineage(query);
                Ok(LineageExtraction {
                    source_tables,
                    target_table: Some(name.to_string()),
                    column_lineage,
                    query_type: QueryType::CreateView,
                    confidence_score: 0.9,
                    extraction_method: ExtractionMethod::SqlParsing,
                })
            }
            other => Err(ExtractError::UnsupportedStatement(format!("{:?}", other))),
        }
    }

    /// Collect every table referenced in FROM/JOIN clauses, recursing into
    /// CTEs, set-operation branches, and subqueries in FROM.
    fn collect_query_sources(&self, query: &Query, tables: &mut Vec<String>) {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.collect_query_sources(&cte.query, tables);
            }
        }
        self.collect_body_sources(&query.body, tables);
    }

    fn collect_body_sources(&self, body: &SetExpr, tables: &mut Vec<String>) {
        match body {
            SetExpr::Select(select) => {
                for table_with_joins in &select.from {
                    self.collect_table_sources(table_with_joins, tables);
                }
            }
            SetExpr::Query(query) => self.collect_query_sources(query, tables),
            SetExpr::SetOperation { left, right, .. } => {
                self.collect_body_sources(left, tables);
                self.collect_body_sources(right, tables);
            }
            _ => {}
        }
    }

    fn collect_table_sources(&self, table_with_joins: &TableWithJoins, tables: &mut Vec<String>) {
        self.collect_factor_sources(&table_with_joins.relation, tables);
        for join in &table_with_joins.joins {
            self.collect_factor_sources(&join.relation, tables);
        }
    }

    fn collect_factor_sources(&self, factor: &TableFactor, tables: &mut Vec<String>) {
        match factor {
            TableFactor::Table { name, .. } => {
                let name = name.to_string();
                if !tables.contains(&name) {
                    tables.push(name);
                }
            }
            TableFactor::Derived { subquery, .. } => {
                self.collect_query_sources(subquery, tables);
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => {
                self.collect_table_sources(table_with_joins, tables);
            }
            _ => {}
        }
    }

    /// Positional column pairing for `INSERT (cols...) SELECT exprs...`.
    ///
    /// Emitted only when the target column list and the SELECT output list
    /// have the same length; an ambiguous positional mapping is worse than
    /// none. Wildcard output items make the list unpairable.
    fn insert_positional_lineage(
        &self,
        target_columns: &[Ident],
        source: &Query,
    ) -> Vec<ColumnLineage> {
        if target_columns.is_empty() {
            return Vec::new();
        }
        let SetExpr::Select(select) = source.body.as_ref() else {
            return Vec::new();
        };

        let mut outputs: Vec<(String, TransformationKind)> = Vec::new();
        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                    outputs.push((source_column_name(expr), transformation_of(expr)));
                }
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                    return Vec::new();
                }
            }
        }

        if outputs.len() != target_columns.len() {
            return Vec::new();
        }

        target_columns
            .iter()
            .zip(outputs)
            .map(|(target, (source, transformation))| {
                ColumnLineage::new(source, target.value.clone(), transformation)
            })
            .collect()
    }

    /// Alias-based column pairing for `CREATE ... AS SELECT` and
    /// `CREATE VIEW`: each output expression maps to its alias, or to its
    /// own inferred name when unaliased.
    fn projection_lineage(&self, query: &Query) -> Vec<ColumnLineage> {
        let SetExpr::Select(select) = query.body.as_ref() else {
            return Vec::new();
        };

        let mut lineage = Vec::new();
        for item in &select.projection {
            match item {
                SelectItem::ExprWithAlias { expr, alias } => {
                    lineage.push(ColumnLineage::new(
                        source_column_name(expr),
                        alias.value.clone(),
                        transformation_of(expr),
                    ));
                }
                SelectItem::UnnamedExpr(expr) => {
                    lineage.push(ColumnLineage::new(
                        source_column_name(expr),
                        infer_column_name(expr),
                        transformation_of(expr),
                    ));
                }
                // Wildcards need a schema lookup to expand; no column lineage.
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {}
            }
        }
        lineage
    }
}

/// Source-side name for an output expression: the column name for plain
/// references, the expression text otherwise.
fn source_column_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(ident) => ident.value.clone(),
        Expr::CompoundIdentifier(parts) => parts
            .last()
            .map(|i| i.value.clone())
            .unwrap_or_else(|| expr.to_string()),
        _ => expr.to_string(),
    }
}

/// Infer a column name from an expression (for unnamed SELECT items).
fn infer_column_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(ident) => ident.value.clone(),
        Expr::CompoundIdentifier(parts) => parts
            .last()
            .map(|i| i.value.clone())
            .unwrap_or_else(|| "?column?".to_string()),
        Expr::Function(func) => func.name.to_string(),
        _ => "?column?".to_string(),
    }
}

fn transformation_of(expr: &Expr) -> TransformationKind {
    match expr {
        Expr::Function(func) if is_aggregate_function(&func.name.to_string().to_uppercase()) => {
            TransformationKind::Aggregate
        }
        _ => TransformationKind::PassThrough,
    }
}

/// Check if a function name is an aggregate function.
fn is_aggregate_function(name: &str) -> bool {
    matches!(
        name,
        "SUM"
            | "COUNT"
            | "AVG"
            | "MIN"
            | "MAX"
            | "STDDEV"
            | "STDDEV_POP"
            | "STDDEV_SAMP"
            | "VARIANCE"
            | "VAR_POP"
            | "VAR_SAMP"
            | "ARRAY_AGG"
            | "STRING_AGG"
            | "GROUP_CONCAT"
            | "LISTAGG"
            | "BOOL_AND"
            | "BOOL_OR"
            | "PERCENTILE_CONT"
            | "PERCENTILE_DISC"
            | "APPROX_COUNT_DISTINCT"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(sql: &str) -> LineageExtraction {
        SqlLineageExtractor::new().extract(sql, "mysql")
    }

    #[test]
    fn test_bare_select() {
        let result = extract("SELECT customer_id, amount FROM orders");
        assert_eq!(result.query_type, QueryType::Select);
        assert_eq!(result.source_tables, vec!["orders"]);
        assert!(result.target_table.is_none());
        assert!(result.column_lineage.is_empty());
        assert_eq!(result.confidence_score, 0.7);
        assert_eq!(result.extraction_method, ExtractionMethod::SqlParsing);
    }

    #[test]
    fn test_select_with_joins_collects_all_sources() {
        let result = extract(
            "SELECT o.id, c.name, p.sku
             FROM orders o
             JOIN customers c ON o.customer_id = c.id
             LEFT JOIN products p ON o.product_id = p.id",
        );
        assert_eq!(result.source_tables, vec!["orders", "customers", "products"]);
    }

    #[test]
    fn test_select_sources_are_deduplicated() {
        let result = extract("SELECT a.id FROM orders a JOIN orders b ON a.id = b.id");
        assert_eq!(result.source_tables, vec!["orders"]);
    }

    #[test]
    fn test_subquery_in_from_is_recursed() {
        let result = extract(
            "SELECT t.total FROM (SELECT SUM(amount) AS total FROM payments) t JOIN regions r ON 1=1",
        );
        assert_eq!(result.source_tables, vec!["payments", "regions"]);
    }

    #[test]
    fn test_union_collects_both_sides() {
        let result = extract("SELECT id FROM archive_orders UNION ALL SELECT id FROM orders");
        assert_eq!(result.source_tables, vec!["archive_orders", "orders"]);
    }

    #[test]
    fn test_insert_select_positional_pairing() {
        let result = extract(
            "INSERT INTO sales_summary (total, region) \
             SELECT SUM(amount), region FROM sales GROUP BY region",
        );
        assert_eq!(result.query_type, QueryType::Insert);
        assert_eq!(result.target_table.as_deref(), Some("sales_summary"));
        assert_eq!(result.source_tables, vec!["sales"]);
        assert_eq!(result.confidence_score, 0.9);
        assert_eq!(result.column_lineage.len(), 2);

        assert_eq!(result.column_lineage[0].source_column, "SUM(amount)");
        assert_eq!(result.column_lineage[0].target_column, "total");
        assert_eq!(
            result.column_lineage[0].transformation,
            TransformationKind::Aggregate
        );

        assert_eq!(result.column_lineage[1].source_column, "region");
        assert_eq!(result.column_lineage[1].target_column, "region");
        assert_eq!(
            result.column_lineage[1].transformation,
            TransformationKind::PassThrough
        );
    }

    #[test]
    fn test_insert_length_mismatch_emits_no_column_lineage() {
        let result = extract(
            "INSERT INTO sales_summary (total, region, extra) \
             SELECT SUM(amount), region FROM sales GROUP BY region",
        );
        assert_eq!(result.query_type, QueryType::Insert);
        assert!(result.column_lineage.is_empty());
        // Statement-level lineage still present.
        assert_eq!(result.source_tables, vec!["sales"]);
        assert_eq!(result.target_table.as_deref(), Some("sales_summary"));
    }

    #[test]
    fn test_insert_without_column_list_emits_no_column_lineage() {
        let result = extract("INSERT INTO dst SELECT a, b FROM src");
        assert!(result.column_lineage.is_empty());
        assert_eq!(result.source_tables, vec!["src"]);
    }

    #[test]
    fn test_insert_select_star_is_unpairable() {
        let result = extract("INSERT INTO dst (a) SELECT * FROM src");
        assert!(result.column_lineage.is_empty());
    }

    #[test]
    fn test_create_table_as_select() {
        let result = extract(
            "CREATE TABLE monthly_sales AS \
             SELECT region, SUM(amount) AS total_sales FROM orders GROUP BY region",
        );
        assert_eq!(result.query_type, QueryType::Create);
        assert_eq!(result.target_table.as_deref(), Some("monthly_sales"));
        assert_eq!(result.source_tables, vec!["orders"]);
        assert_eq!(result.confidence_score, 0.9);
        assert_eq!(result.column_lineage.len(), 2);

        assert_eq!(result.column_lineage[0].source_column, "region");
        assert_eq!(result.column_lineage[0].target_column, "region");
        assert_eq!(result.column_lineage[1].target_column, "total_sales");
        assert_eq!(
            result.column_lineage[1].transformation,
            TransformationKind::Aggregate
        );
    }

    #[test]
    fn test_plain_create_table_has_target_only() {
        let result = extract("CREATE TABLE t (id INT, name VARCHAR(20))");
        assert_eq!(result.query_type, QueryType::Create);
        assert_eq!(result.target_table.as_deref(), Some("t"));
        assert!(result.source_tables.is_empty());
        assert!(result.column_lineage.is_empty());
        assert_eq!(result.confidence_score, 0.9);
    }

    #[test]
    fn test_create_view() {
        let result = extract(
            "CREATE VIEW active_customers AS \
             SELECT c.customer_id, c.name AS customer_name FROM customers c WHERE c.active = 1",
        );
        assert_eq!(result.query_type, QueryType::CreateView);
        assert_eq!(result.target_table.as_deref(), Some("active_customers"));
        assert_eq!(result.source_tables, vec!["customers"]);
        assert_eq!(result.column_lineage.len(), 2);
        assert_eq!(result.column_lineage[1].source_column, "name");
        assert_eq!(result.column_lineage[1].target_column, "customer_name");
    }

    #[test]
    fn test_qualified_target_table() {
        let result = extract("INSERT INTO reporting.daily (a) SELECT x FROM src");
        assert_eq!(result.target_table.as_deref(), Some("reporting.daily"));
    }

    #[test]
    fn test_malformed_sql_degrades_to_fallback() {
        let result = extract("INSERT INTO sales_summary SELEC oops FROM sales");
        assert_eq!(result.extraction_method, ExtractionMethod::RegexFallback);
        assert_eq!(result.target_table.as_deref(), Some("sales_summary"));
        assert_eq!(result.confidence_score, 0.5);
        assert!(result.column_lineage.is_empty());
    }

    #[test]
    fn test_gibberish_degrades_to_low_confidence_fallback() {
        let result = extract("not sql at all");
        assert_eq!(result.extraction_method, ExtractionMethod::RegexFallback);
        assert_eq!(result.query_type, QueryType::Unknown);
        assert_eq!(result.confidence_score, 0.3);
    }

    #[test]
    fn test_unsupported_statement_degrades_to_fallback() {
        let result = extract("DELETE FROM orders WHERE id = 1");
        assert_eq!(result.extraction_method, ExtractionMethod::RegexFallback);
        // The fallback still recovers the FROM table.
        assert_eq!(result.source_tables, vec!["orders"]);
        assert_eq!(result.confidence_score, 0.5);
    }

    #[test]
    fn test_empty_sql_degrades_to_fallback() {
        let result = extract("   ");
        assert_eq!(result.extraction_method, ExtractionMethod::RegexFallback);
        assert_eq!(result.confidence_score, 0.3);
    }

    #[test]
    fn test_unknown_dialect_tag_uses_generic_dialect() {
        let result = SqlLineageExtractor::new().extract("SELECT a FROM t", "no_such_dialect");
        assert_eq!(result.extraction_method, ExtractionMethod::SqlParsing);
        assert_eq!(result.source_tables, vec!["t"]);
    }

    #[test]
    fn test_cte_sources_are_collected() {
        let result = extract(
            "CREATE TABLE recent_customer_orders AS \
             WITH recent AS (SELECT * FROM orders WHERE d > 0) \
             SELECT r.id FROM recent r JOIN customers c ON r.cid = c.id",
        );
        assert!(result.source_tables.contains(&"orders".to_string()));
        assert!(result.source_tables.contains(&"customers".to_string()));
    }
}
