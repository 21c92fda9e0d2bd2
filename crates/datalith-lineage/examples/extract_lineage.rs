//! Extract lineage from a handful of SQL statements and print the results.
//!
//! Run with: `cargo run --example extract_lineage -p datalith-lineage`

use datalith_lineage::SqlLineageExtractor;

fn main() {
    let extractor = SqlLineageExtractor::new();

    let statements = [
        "INSERT INTO sales_summary (total, region) \
         SELECT SUM(amount), region FROM sales GROUP BY region",
        "CREATE TABLE monthly_sales AS \
         SELECT region, SUM(amount) AS total_sales FROM orders GROUP BY region",
        "SELECT o.id, c.name FROM orders o JOIN customers c ON o.customer_id = c.id",
        "this is not valid sql, FROM somewhere",
    ];

    for sql in statements {
        let result = extractor.extract(sql, "mysql");
        println!("sql: {}", sql);
        println!(
            "  {} via {} (confidence {:.2})",
            result.query_type, result.extraction_method, result.confidence_score
        );
        println!(
            "  sources: {:?}, target: {:?}",
            result.source_tables, result.target_table
        );
        for col in &result.column_lineage {
            println!(
                "  {} -> {} [{}]",
                col.source_column, col.target_column, col.transformation
            );
        }
        println!();
    }
}
