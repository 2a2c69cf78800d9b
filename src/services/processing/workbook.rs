//! Spreadsheet reader
//!
//! Opens a workbook from in-memory bytes, resolves sheets by name or ordinal
//! and extracts the header row and data records of a sheet. The whole
//! workbook is decoded eagerly; nothing is streamed.

use calamine::{Data, Dimensions, Range, Reader, Sheets, open_workbook_auto_from_rs};
use std::collections::HashMap;
use std::io::Cursor;

use super::utils::{cell_text, is_header_name, to_cell_value};
use crate::common::errors::{ProcessingError, ProcessingResult};
use crate::services::models::{CellValue, SheetIdentifier, SourceRow};

/// Rectangular merged span, zero-based and inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRegion {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl From<&Dimensions> for MergeRegion {
    fn from(dims: &Dimensions) -> Self {
        Self {
            start_row: dims.start.0,
            start_col: dims.start.1,
            end_row: dims.end.0,
            end_col: dims.end.1,
        }
    }
}

/// A decoded worksheet: its cell grid plus merge metadata
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    cells: Range<Data>,
    merges: Vec<MergeRegion>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, cells: Range<Data>, merges: Vec<MergeRegion>) -> Self {
        Self {
            name: name.into(),
            cells,
            merges,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn merge_regions(&self) -> &[MergeRegion] {
        &self.merges
    }
}

/// Read-only view over a workbook's sheets, in workbook order
#[derive(Debug, Clone)]
pub struct Workbook {
    sheet_names: Vec<String>,
    sheets: HashMap<String, Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }
}

/// Open a workbook from raw bytes (xlsx, xlsm, xls, xlsb, ods)
pub fn open_workbook(bytes: &[u8]) -> ProcessingResult<Workbook> {
    let mut reader = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        ProcessingError::UnreadableFile {
            message: e.to_string(),
        }
    })?;

    let sheet_names = reader.sheet_names();
    let mut sheets = HashMap::with_capacity(sheet_names.len());

    for name in &sheet_names {
        let cells = reader
            .worksheet_range(name)
            .map_err(|e| ProcessingError::UnreadableFile {
                message: format!("Failed to read sheet '{name}': {e}"),
            })?;
        let merges = load_merge_regions(&mut reader, name);
        sheets.insert(name.clone(), Sheet::new(name.clone(), cells, merges));
    }

    tracing::debug!("Opened workbook with {} sheet(s)", sheet_names.len());

    Ok(Workbook {
        sheet_names,
        sheets,
    })
}

/// Merge metadata is only exposed for xlsx and xls containers
fn load_merge_regions(reader: &mut Sheets<Cursor<&[u8]>>, name: &str) -> Vec<MergeRegion> {
    let dimensions = match reader {
        Sheets::Xlsx(xlsx) => match xlsx.worksheet_merge_cells(name) {
            Some(Ok(dims)) => dims,
            Some(Err(e)) => {
                tracing::warn!("Could not read merge cells of sheet '{name}': {e}");
                Vec::new()
            }
            None => Vec::new(),
        },
        Sheets::Xls(xls) => xls.worksheet_merge_cells(name).unwrap_or_default(),
        Sheets::Xlsb(_) | Sheets::Ods(_) => Vec::new(),
    };

    dimensions.iter().map(MergeRegion::from).collect()
}

/// Sheet names in workbook order
pub fn list_sheet_names(workbook: &Workbook) -> Vec<String> {
    workbook.sheet_names.clone()
}

/// Ordinal of the sheet an identifier selects: exact name first, then
/// zero-based ordinal
pub fn sheet_ordinal(workbook: &Workbook, identifier: &SheetIdentifier) -> ProcessingResult<usize> {
    let ordinal = match identifier {
        SheetIdentifier::Index(index) => Some(*index),
        SheetIdentifier::Name(name) => workbook
            .sheet_names
            .iter()
            .position(|candidate| candidate == name)
            .or_else(|| name.trim().parse::<usize>().ok()),
    };

    ordinal
        .filter(|idx| *idx < workbook.sheet_names.len())
        .ok_or_else(|| ProcessingError::SheetNotFound {
            identifier: identifier.to_string(),
        })
}

/// Resolve a sheet by exact name first, then by zero-based ordinal
pub fn resolve_sheet<'a>(
    workbook: &'a Workbook,
    identifier: &SheetIdentifier,
) -> ProcessingResult<&'a Sheet> {
    let ordinal = sheet_ordinal(workbook, identifier)?;
    workbook
        .sheets
        .get(&workbook.sheet_names[ordinal])
        .ok_or_else(|| ProcessingError::SheetNotFound {
            identifier: identifier.to_string(),
        })
}

/// Named columns of the first row within `max_scan_rows` leading rows that
/// has any, together with that row's offset in the used range
fn find_header_row(sheet: &Sheet, max_scan_rows: usize) -> Option<(usize, Vec<(usize, String)>)> {
    sheet
        .cells
        .rows()
        .take(max_scan_rows)
        .enumerate()
        .find_map(|(row_idx, row)| {
            let columns: Vec<(usize, String)> = row
                .iter()
                .enumerate()
                .map(|(idx, cell)| (idx, cell_text(cell)))
                .filter(|(_, text)| is_header_name(text))
                .collect();
            (!columns.is_empty()).then_some((row_idx, columns))
        })
}

/// Header names of the first named row within `max_scan_rows` leading rows.
///
/// Empty and sentinel cells are dropped rather than replaced, so the result
/// is compacted: positions do not correspond to sheet column indices.
pub fn read_header_row(sheet: &Sheet, max_scan_rows: usize) -> Vec<String> {
    find_header_row(sheet, max_scan_rows)
        .map(|(_, columns)| columns.into_iter().map(|(_, name)| name).collect())
        .unwrap_or_default()
}

/// Data records keyed by header name; missing cells become `Null`.
///
/// The header row is found exactly as `read_header_row` finds it, so record
/// keys always match the reported headers. Fully blank rows are skipped.
/// Columns without a usable header are left out of every record.
pub fn read_all_rows(sheet: &Sheet, max_scan_rows: usize) -> Vec<SourceRow> {
    let Some((header_idx, columns)) = find_header_row(sheet, max_scan_rows) else {
        return Vec::new();
    };

    sheet
        .cells
        .rows()
        .skip(header_idx + 1)
        .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|row| {
            let mut record = SourceRow::with_capacity(columns.len());
            for (idx, name) in &columns {
                let value = row.get(*idx).map_or(CellValue::Null, to_cell_value);
                record.insert(name.clone(), value);
            }
            record
        })
        .collect()
}
