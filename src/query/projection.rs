//! Column projection: keep rows as name/value mappings or reduce them to
//! positional value lists.

use crate::db::{Row, Value};

/// A row ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectedRow {
    /// Column names kept; serializes as a JSON object.
    Named(Row),
    /// Column names dropped; serializes as a JSON array in column order.
    Values(Vec<Value>),
}

/// Projects every row according to `include_columns`.
pub fn project_rows(rows: Vec<Row>, include_columns: bool) -> Vec<ProjectedRow> {
    rows.into_iter()
        .map(|row| {
            if include_columns {
                ProjectedRow::Named(row)
            } else {
                ProjectedRow::Values(row.into_values())
            }
        })
        .collect()
}
