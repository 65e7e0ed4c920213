use std::collections::HashSet;

use crate::error::ResultsError;
use crate::model::{IDENTIFIER_COLUMN, ProjectedTable, ResultTable, StudentRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub table: ProjectedTable,
    /// Wanted columns the table does not have, in wanted order.
    pub missing_columns: Vec<String>,
}

/// Restricts `table` to the wanted subject columns, in wanted order. The
/// identifier column is always kept and never reported missing.
pub fn project(table: &ResultTable, wanted_columns: &[String]) -> Result<Projection, ResultsError> {
    let mut seen = HashSet::new();
    let mut missing_columns = Vec::new();
    let mut keep_indices = Vec::new();

    for column in wanted_columns {
        if column == IDENTIFIER_COLUMN || !seen.insert(column.as_str()) {
            continue;
        }
        match table.subjects.iter().position(|subject| subject == column) {
            Some(index) => keep_indices.push(index),
            None => missing_columns.push(column.clone()),
        }
    }

    if keep_indices.is_empty() {
        return Err(ResultsError::NoUsableColumns {
            missing: missing_columns,
        });
    }

    let subjects = keep_indices
        .iter()
        .map(|&index| table.subjects[index].clone())
        .collect::<Vec<_>>();
    let rows = table
        .rows
        .iter()
        .map(|row| StudentRow {
            usn: row.usn.clone(),
            cells: keep_indices
                .iter()
                .filter_map(|&index| row.cells.get(index).copied())
                .collect(),
        })
        .collect::<Vec<_>>();

    Ok(Projection {
        table: ProjectedTable { subjects, rows },
        missing_columns,
    })
}
