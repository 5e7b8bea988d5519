//! Typed table → JSON rows, for previews

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

/// Convert up to `limit` rows of a batch into JSON objects
pub fn batch_to_rows(batch: &RecordBatch, limit: usize) -> Result<Vec<JsonValue>> {
    let schema = batch.schema();
    let num_rows = batch.num_rows().min(limit);
    let mut rows = Vec::with_capacity(num_rows);

    for row in 0..num_rows {
        let mut record = JsonObject::new();
        for (field, column) in schema.fields().iter().zip(batch.columns()) {
            record.insert(field.name().clone(), value_at(column, row)?);
        }
        rows.push(JsonValue::Object(record));
    }

    Ok(rows)
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::Other(format!("Failed to downcast to {name}")))
}

fn value_at(array: &ArrayRef, row: usize) -> Result<JsonValue> {
    if array.is_null(row) {
        return Ok(JsonValue::Null);
    }

    let value = match array.data_type() {
        DataType::Boolean => {
            JsonValue::Bool(downcast::<BooleanArray>(array, "BooleanArray")?.value(row))
        }
        DataType::Int64 => {
            JsonValue::from(downcast::<Int64Array>(array, "Int64Array")?.value(row))
        }
        DataType::Float64 => {
            let value = downcast::<Float64Array>(array, "Float64Array")?.value(row);
            serde_json::Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
        }
        DataType::Utf8 => {
            let value = downcast::<StringArray>(array, "StringArray")?.value(row);
            JsonValue::String(value.to_string())
        }
        _ => JsonValue::String(array_value_to_string(array, row)?),
    };
    Ok(value)
}
