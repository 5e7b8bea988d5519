// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # schools-etl
//!
//! Loads the NCES School Characteristics layer from its public ArcGIS
//! feature service into a BigQuery table.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schools_etl::config::PipelineConfig;
//! use schools_etl::http::{HttpClient, HttpClientConfig};
//! use schools_etl::source::FeatureServiceSource;
//! use schools_etl::warehouse::{BigQueryClient, TableRef};
//!
//! #[tokio::main]
//! async fn main() -> schools_etl::Result<()> {
//!     let config = PipelineConfig::default();
//!     let source = FeatureServiceSource::new(config.source.clone());
//!     let source_client = source.http_client()?;
//!
//!     let auth = schools_etl::auth::resolve_credentials(None)?;
//!     let http = HttpClient::with_auth(HttpClientConfig::default(), auth)?;
//!     let warehouse = BigQueryClient::new(http, &config.destination);
//!
//!     let table = TableRef::from(&config.destination);
//!     schools_etl::pipeline::run(&source, &source_client, &warehouse, &table).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────────┐   ┌──────────────────┐
//! │  source  │ → │          transform           │ → │    warehouse     │
//! │ GeoJSON  │   │ flatten → rename → coerce    │   │ schema → ensure  │
//! │ features │   │          RecordBatch         │   │ → Parquet load   │
//! └──────────┘   └──────────────────────────────┘   └──────────────────┘
//!       ↑                                                    ↑
//!     http ─────────────────── auth (Google ADC) ────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Common types and type aliases
pub mod types;

/// Pipeline configuration
pub mod config;

/// Google credential resolution and token handling
pub mod auth;

/// HTTP client
pub mod http;

/// Feature service reader
pub mod source;

/// Flatten, rename and type records
pub mod transform;

/// Schema inference and BigQuery loading
pub mod warehouse;

/// Run orchestration
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::PipelineConfig;
pub use pipeline::{prepare, run, PreparedTable, RunSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
