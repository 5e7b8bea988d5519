//! Transformation from features to a typed table
//!
//! # Overview
//!
//! - `flatten`: features → column-oriented [`ColumnTable`] of raw JSON values
//! - `rename`: source field names → destination column names
//! - `coerce_integer_column`: whole-number coercion of count columns
//! - `to_record_batch`: typed Arrow `RecordBatch` for loading
//! - `batch_to_rows`: typed rows back to JSON for previews
//!
//! [`build_table`] runs the whole chain with the school field contract.

mod coerce;
mod fields;
mod flatten;
mod rename;
mod rows;
mod types;

pub use coerce::{coerce_integer_column, infer_column_type, to_record_batch};
pub use fields::{destination_columns, source_fields, FIELD_MAPPING, NUMERIC_COLUMNS};
pub use flatten::flatten;
pub use rename::rename;
pub use rows::batch_to_rows;
pub use types::{Column, ColumnTable};

use crate::error::Result;
use crate::source::Feature;
use arrow::record_batch::RecordBatch;
use tracing::debug;

/// Flatten, rename and type the school features
pub fn build_table(features: &[Feature]) -> Result<RecordBatch> {
    let table = flatten(features, &source_fields())?;
    debug!(
        "Flattened {} records into {} columns",
        table.num_rows(),
        table.num_columns()
    );

    let table = rename(table, FIELD_MAPPING)?;
    to_record_batch(&table, &NUMERIC_COLUMNS)
}

#[cfg(test)]
mod tests;
