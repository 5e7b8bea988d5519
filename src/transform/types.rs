//! Column-oriented table of raw JSON values

use crate::error::{Error, Result};
use crate::types::JsonValue;

/// A named column of raw values
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<JsonValue>,
}

impl Column {
    /// Create a column
    pub fn new(name: impl Into<String>, values: Vec<JsonValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Ordered columns of equal length with unique names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTable {
    columns: Vec<Column>,
}

impl ColumnTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from columns, checking length and name invariants
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::new();
        for column in columns {
            table.push(column)?;
        }
        Ok(table)
    }

    /// Append a column
    pub fn push(&mut self, column: Column) -> Result<()> {
        if self.column(&column.name).is_some() {
            return Err(Error::DuplicateColumn {
                column: column.name,
            });
        }
        if let Some(first) = self.columns.first() {
            if first.values.len() != column.values.len() {
                return Err(Error::ColumnLength {
                    column: column.name,
                    expected: first.values.len(),
                    actual: column.values.len(),
                });
            }
        }
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows (0 for a table without columns)
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Iterate columns in order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Consume the table into its columns
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}
