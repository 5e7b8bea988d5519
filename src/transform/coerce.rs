//! Numeric coercion and Arrow typing
//!
//! Count columns arrive as a mix of integers, floats, numeric strings and
//! nulls. They are coerced to non-null `Int64` (missing → 0, fractions
//! truncated). Every other column is typed from its values.

use super::types::{Column, ColumnTable};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::sync::Arc;

/// 2^63: truncated floats must lie in `[-2^63, 2^63)` to fit an i64
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// A raw value read as a number
enum Numeric {
    Missing,
    Integer(i64),
    Float(f64),
}

/// Coerce a column to whole numbers
///
/// Null, blank text and NaN become 0; integers and integer text are kept
/// exactly; other numbers and numeric text are truncated toward zero;
/// booleans become 1/0. Non-numeric text, nested values, infinities and
/// out-of-range values are conversion errors.
pub fn coerce_integer_column(column: &Column) -> Result<Vec<i64>> {
    column
        .values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            let converted = match parse_numeric(value) {
                Some(Numeric::Missing) => Some(0),
                Some(Numeric::Integer(i)) => Some(i),
                Some(Numeric::Float(n)) => truncate(n),
                None => None,
            };

            converted.ok_or_else(|| Error::Conversion {
                column: column.name.clone(),
                row,
                value: value.to_string(),
            })
        })
        .collect()
}

/// Truncate toward zero; NaN counts as missing
fn truncate(n: f64) -> Option<i64> {
    if n.is_nan() {
        return Some(0);
    }
    let t = n.trunc();
    (t >= -I64_BOUND && t < I64_BOUND).then_some(t as i64)
}

/// Read a JSON value as a number; `None` means it is not numeric
fn parse_numeric(value: &JsonValue) -> Option<Numeric> {
    match value {
        JsonValue::Null => Some(Numeric::Missing),
        JsonValue::Bool(b) => Some(Numeric::Integer(i64::from(*b))),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Some(Numeric::Integer(i)),
            None => n.as_f64().map(Numeric::Float),
        },
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(Numeric::Missing)
            } else if let Ok(i) = trimmed.parse::<i64>() {
                Some(Numeric::Integer(i))
            } else {
                trimmed.parse::<f64>().ok().map(Numeric::Float)
            }
        }
        JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

/// Infer the Arrow type of a raw column
///
/// - integers only, no nulls → `Int64`
/// - integers with nulls, or any floats → `Float64`
/// - booleans only, no nulls → `Boolean`
/// - anything else (text, mixed, all-null) → `Utf8`
pub fn infer_column_type(values: &[JsonValue]) -> DataType {
    let mut inferred: Option<DataType> = None;
    let mut has_nulls = false;

    for value in values {
        let value_type = match value {
            JsonValue::Null => {
                has_nulls = true;
                continue;
            }
            JsonValue::Bool(_) => DataType::Boolean,
            JsonValue::Number(n) if n.is_i64() => DataType::Int64,
            JsonValue::Number(_) => DataType::Float64,
            _ => return DataType::Utf8,
        };

        inferred = Some(match inferred {
            None => value_type,
            Some(existing) => merge_types(&existing, &value_type),
        });

        if inferred == Some(DataType::Utf8) {
            return DataType::Utf8;
        }
    }

    match inferred {
        Some(DataType::Int64) if has_nulls => DataType::Float64,
        Some(DataType::Boolean) if has_nulls => DataType::Utf8,
        Some(data_type) => data_type,
        None => DataType::Utf8,
    }
}

/// Merge two value types into a compatible column type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        (a, b) if a == b => a.clone(),
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }
        _ => DataType::Utf8,
    }
}

/// Build an Arrow array of the given type from raw values
fn build_array(values: &[JsonValue], data_type: &DataType) -> ArrayRef {
    match data_type {
        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(JsonValue::as_i64).collect();
            Arc::new(arr)
        }
        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(JsonValue::as_f64).collect();
            Arc::new(arr)
        }
        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(JsonValue::as_bool).collect();
            Arc::new(arr)
        }
        _ => {
            let arr: StringArray = values
                .iter()
                .map(|v| match v {
                    JsonValue::Null => None,
                    JsonValue::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Arc::new(arr)
        }
    }
}

/// Convert a column table into a typed `RecordBatch`
///
/// Columns named in `integer_columns` are coerced to non-null `Int64`; each
/// must exist in the table. Column order is preserved.
pub fn to_record_batch(table: &ColumnTable, integer_columns: &[&str]) -> Result<RecordBatch> {
    for name in integer_columns {
        if table.column(name).is_none() {
            return Err(Error::missing_column(*name));
        }
    }

    let mut fields = Vec::with_capacity(table.num_columns());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.num_columns());

    for column in table.columns() {
        if integer_columns.contains(&column.name.as_str()) {
            let values = coerce_integer_column(column)?;
            fields.push(Field::new(&column.name, DataType::Int64, false));
            arrays.push(Arc::new(Int64Array::from(values)));
        } else {
            let data_type = infer_column_type(&column.values);
            arrays.push(build_array(&column.values, &data_type));
            fields.push(Field::new(&column.name, data_type, true));
        }
    }

    // Row count must survive a table whose columns are all empty
    let options = RecordBatchOptions::new().with_row_count(Some(table.num_rows()));
    let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
    Ok(batch)
}
