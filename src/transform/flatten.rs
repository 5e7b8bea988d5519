//! Features → column table

use super::types::{Column, ColumnTable};
use crate::error::{Error, Result};
use crate::source::Feature;

/// Flatten features into one column per field name
///
/// The identifier key is read from each feature's top level, every other
/// field from its `properties`. Values are kept as raw JSON. A feature
/// missing any field fails with the record index and field name.
pub fn flatten(records: &[Feature], field_names: &[&str]) -> Result<ColumnTable> {
    let mut columns: Vec<Column> = field_names
        .iter()
        .map(|name| Column::new(*name, Vec::with_capacity(records.len())))
        .collect();

    for (index, record) in records.iter().enumerate() {
        for column in &mut columns {
            let value = record
                .get(&column.name)
                .ok_or_else(|| Error::missing_field(index, &column.name))?;
            column.values.push(value.clone());
        }
    }

    ColumnTable::from_columns(columns)
}
