//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Load NCES school characteristics into BigQuery
#[derive(Parser, Debug)]
#[command(name = "schools-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// BigQuery project id
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// BigQuery dataset id
    #[arg(long, global = true)]
    pub dataset: Option<String>,

    /// BigQuery table name
    #[arg(long, global = true)]
    pub table: Option<String>,

    /// Dataset location used when creating the dataset (e.g. US)
    #[arg(long, global = true)]
    pub location: Option<String>,

    /// Feature service query URL
    #[arg(long, global = true)]
    pub source_url: Option<String>,

    /// Page through the feature service this many records at a time
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Google credentials file (service account or authorized user)
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Fetch, transform and load into BigQuery (default)
    Run,

    /// Fetch and transform only; print the schema and the first rows
    Preview {
        /// Rows to print
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}
