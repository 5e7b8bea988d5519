//! Column relabeling

use super::types::{Column, ColumnTable};
use crate::error::Result;

/// Rename columns through `mapping`; unmapped columns keep their name
pub fn rename(table: ColumnTable, mapping: &[(&str, &str)]) -> Result<ColumnTable> {
    let columns = table
        .into_columns()
        .into_iter()
        .map(|column| {
            match mapping.iter().find(|(from, _)| *from == column.name) {
                Some((_, to)) => Column::new(*to, column.values),
                None => column,
            }
        })
        .collect();

    ColumnTable::from_columns(columns)
}
