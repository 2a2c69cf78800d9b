//! Utility functions for cell conversion
//!
//! This module converts calamine cells into engine values and header text.

use calamine::Data;

use crate::services::models::CellValue;

/// Header text that stands for "no value" and is never a column name
pub const UNDEFINED_SENTINEL: &str = "undefined";

/// Convert a calamine cell into an engine value, verbatim
pub fn to_cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            CellValue::String(s.clone())
        }
        Data::DateTime(excel_dt) => excel_dt
            .as_datetime()
            .map_or(CellValue::Float(excel_dt.as_f64()), CellValue::DateTime),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}

/// Display text of a cell as used for header names
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(excel_dt) => excel_dt.as_datetime().map_or_else(
            || excel_dt.as_f64().to_string(),
            |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
        other => other.to_string(),
    }
}

/// Whether a header cell's text names a column
pub fn is_header_name(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed != UNDEFINED_SENTINEL
}
