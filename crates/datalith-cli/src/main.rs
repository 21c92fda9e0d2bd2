//! Datalith CLI
//!
//! Command-line front end for the discovery and lineage engine: normalize
//! storage paths, fingerprint files, extract lineage from SQL, and infer
//! column lineage between schemas. Results are printed as JSON so they can
//! be piped into the catalog's ingestion tooling.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use datalith_core::SchemaField;
use datalith_discovery::{fingerprint, normalize_storage_path};
use datalith_lineage::{infer_column_lineage, SqlLineageExtractor, DEFAULT_MIN_MATCH_RATIO};

#[derive(Parser)]
#[command(name = "datalith")]
#[command(version, about = "Datalith discovery and lineage engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a raw storage path or URL into its canonical location
    NormalizePath {
        /// Raw path or URL (abfs/abfss URL, blob URL, or container/path)
        path: String,

        /// Storage-account hint for bare paths
        #[arg(short, long)]
        account: Option<String>,

        /// Container hint for bare paths
        #[arg(short, long)]
        container: Option<String>,
    },

    /// Fingerprint a file's content and schema
    Fingerprint {
        /// File to hash
        file: std::path::PathBuf,

        /// JSON schema file: an array of {"name", "data_type"} objects
        #[arg(short, long)]
        schema: Option<std::path::PathBuf>,
    },

    /// Extract lineage from a SQL statement
    Extract {
        /// SQL text, or a path to a file containing it when --file is set
        sql: String,

        /// Treat the SQL argument as a file path
        #[arg(short, long)]
        file: bool,

        /// SQL dialect tag (mysql, postgres, bigquery, ...)
        #[arg(short, long, default_value = "mysql")]
        dialect: String,
    },

    /// Infer column lineage between two comma-separated column lists
    Infer {
        /// Source column names, comma-separated
        source: String,

        /// Target column names, comma-separated
        target: String,

        /// Minimum match ratio for the coverage bonus
        #[arg(short, long, default_value_t = DEFAULT_MIN_MATCH_RATIO)]
        min_match_ratio: f64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::NormalizePath {
            path,
            account,
            container,
        } => normalize_path_cmd(&path, account.as_deref(), container.as_deref()),
        Commands::Fingerprint { file, schema } => fingerprint_cmd(&file, schema.as_deref()),
        Commands::Extract { sql, file, dialect } => extract_cmd(&sql, file, &dialect),
        Commands::Infer {
            source,
            target,
            min_match_ratio,
        } => infer_cmd(&source, &target, min_match_ratio),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn normalize_path_cmd(
    path: &str,
    account: Option<&str>,
    container: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let location = normalize_storage_path(path, account, container)?;
    println!("{}", serde_json::to_string_pretty(&location)?);
    Ok(())
}

fn fingerprint_cmd(
    file: &std::path::Path,
    schema: Option<&std::path::Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read(file)?;
    let fields: Vec<SchemaField> = match schema {
        Some(path) => serde_json::from_slice(&std::fs::read(path)?)?,
        None => Vec::new(),
    };
    let fp = fingerprint(&contents, &fields);
    println!("{}", serde_json::to_string_pretty(&fp)?);
    Ok(())
}

fn extract_cmd(sql: &str, from_file: bool, dialect: &str) -> Result<(), Box<dyn std::error::Error>> {
    let text = if from_file {
        std::fs::read_to_string(sql)?
    } else {
        sql.to_string()
    };
    let extraction = SqlLineageExtractor::new().extract(&text, dialect);
    println!("{}", serde_json::to_string_pretty(&extraction)?);
    Ok(())
}

fn infer_cmd(
    source: &str,
    target: &str,
    min_match_ratio: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let to_fields = |list: &str| -> Vec<SchemaField> {
        list.split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| SchemaField::new(n, "unknown"))
            .collect()
    };

    let inference = infer_column_lineage(&to_fields(source), &to_fields(target), min_match_ratio);
    println!("{}", serde_json::to_string_pretty(&inference)?);
    Ok(())
}
