//! CLI module
//!
//! Command-line interface for the school characteristics ETL.
//!
//! # Commands
//!
//! - `run` - Fetch, transform and load into BigQuery (default)
//! - `preview` - Fetch and transform, print schema and sample rows

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
