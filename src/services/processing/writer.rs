//! Spreadsheet writer
//!
//! Serializes projected rows into a single-sheet xlsx workbook held in memory.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::common::errors::{ProcessingError, ProcessingResult};
use crate::services::models::{CellValue, OutputRow};

/// Name of the only sheet in every output workbook
pub const OUTPUT_SHEET_NAME: &str = "ConvertedData";

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Build the output workbook: header row `output_columns`, then one row per record.
///
/// Columns missing from a record are left blank.
pub fn write_workbook(output_columns: &[String], rows: &[OutputRow]) -> ProcessingResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET_NAME).map_err(serialization)?;

    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);

    for (col_idx, column) in output_columns.iter().enumerate() {
        let col = column_index(col_idx)?;
        worksheet
            .write_string(0, col, column.as_str())
            .map_err(serialization)?;
    }

    for (row_idx, record) in rows.iter().enumerate() {
        let row = u32::try_from(row_idx + 1).map_err(|_| ProcessingError::SerializationError {
            message: format!("Row {} exceeds the worksheet row limit", row_idx + 1),
        })?;

        for (col_idx, column) in output_columns.iter().enumerate() {
            let Some(value) = record.get(column) else {
                continue;
            };
            write_cell(worksheet, row, column_index(col_idx)?, value, &datetime_format).map_err(
                |e| ProcessingError::SerializationError {
                    message: format!("Column '{column}', row {}: {e}", row_idx + 1),
                },
            )?;
        }
    }

    workbook.save_to_buffer().map_err(serialization)
}

/// Write one value; `Null` leaves the cell untouched.
pub fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    datetime_format: &Format,
) -> Result<(), XlsxError> {
    match value {
        CellValue::Null => {}
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::Int(i) => {
            // Excel stores every number as a double
            #[allow(clippy::cast_precision_loss)]
            let number = *i as f64;
            worksheet.write_number(row, col, number)?;
        }
        CellValue::Float(f) => {
            if !f.is_finite() {
                return Err(XlsxError::ParameterError(format!(
                    "non-finite number {f} cannot be stored"
                )));
            }
            worksheet.write_number(row, col, *f)?;
        }
        CellValue::String(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        CellValue::DateTime(dt) => {
            worksheet.write_datetime_with_format(row, col, dt, datetime_format)?;
        }
    }
    Ok(())
}

fn column_index(col_idx: usize) -> ProcessingResult<u16> {
    u16::try_from(col_idx).map_err(|_| ProcessingError::SerializationError {
        message: format!("Column index {col_idx} exceeds the worksheet column limit"),
    })
}

#[allow(clippy::needless_pass_by_value)]
fn serialization(e: XlsxError) -> ProcessingError {
    ProcessingError::SerializationError {
        message: e.to_string(),
    }
}
