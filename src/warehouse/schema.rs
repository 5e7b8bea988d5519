//! Warehouse schema inference
//!
//! Maps Arrow column types onto warehouse column types with an ordered rule
//! list. The first matching rule wins; unmatched types load as STRING.

use super::types::{SchemaField, TableSchema, WarehouseType};
use crate::error::{Error, Result};
use arrow::array::ArrayRef;
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::sync::Arc;

/// A single type-mapping rule
struct TypeRule {
    matches: fn(&DataType) -> bool,
    target: WarehouseType,
}

const TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        matches: DataType::is_integer,
        target: WarehouseType::Integer,
    },
    TypeRule {
        matches: DataType::is_floating,
        target: WarehouseType::Float,
    },
    TypeRule {
        matches: is_date_or_timestamp,
        target: WarehouseType::Timestamp,
    },
];

fn is_date_or_timestamp(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64
    )
}

/// Warehouse type for one Arrow type
pub fn warehouse_type(data_type: &DataType) -> WarehouseType {
    TYPE_RULES
        .iter()
        .find(|rule| (rule.matches)(data_type))
        .map_or(WarehouseType::String, |rule| rule.target)
}

/// Infer the table schema of a batch, one nullable field per column in order
pub fn infer_schema(batch: &RecordBatch) -> TableSchema {
    let fields = batch
        .schema()
        .fields()
        .iter()
        .map(|field| SchemaField::nullable(field.name(), warehouse_type(field.data_type())))
        .collect();
    TableSchema::new(fields)
}

/// Cast each column to the Arrow type that carries its warehouse type
///
/// Output columns follow the order of `schema`. A schema field with no
/// matching column is an error.
pub fn conform_to_schema(batch: &RecordBatch, schema: &TableSchema) -> Result<RecordBatch> {
    let source_schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.len());

    for schema_field in &schema.fields {
        let (index, source_field) = source_schema
            .column_with_name(&schema_field.name)
            .ok_or_else(|| Error::missing_column(&schema_field.name))?;

        let target = schema_field.field_type.arrow_type();
        let column = batch.column(index);
        let array = if column.data_type() == &target {
            Arc::clone(column)
        } else {
            cast(column, &target)?
        };

        fields.push(Field::new(
            &schema_field.name,
            target,
            source_field.is_nullable(),
        ));
        arrays.push(array);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    let conformed =
        RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
    Ok(conformed)
}
