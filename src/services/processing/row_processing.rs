//! Row projection
//!
//! Re-projects source records onto the resolved template columns. Total and
//! pure: one output row per source row, no filtering, no coercion.

use super::mapping::ResolvedMapping;
use crate::services::models::{CellValue, OutputRow, SourceRow};

/// Project a single source row
pub fn project_row(resolved: &ResolvedMapping, source_row: &SourceRow) -> OutputRow {
    resolved
        .columns()
        .iter()
        .map(|column| {
            let value = column
                .source
                .as_ref()
                .and_then(|source| source_row.get(source))
                .cloned()
                .unwrap_or(CellValue::Null);
            (column.template.clone(), value)
        })
        .collect()
}

/// Project every source row, preserving order
pub fn project(resolved: &ResolvedMapping, source_rows: &[SourceRow]) -> Vec<OutputRow> {
    source_rows
        .iter()
        .map(|row| project_row(resolved, row))
        .collect()
}
