//! In-memory workbooks for tests

use calamine::{Data, Range};
use rust_xlsxwriter::{Format, Workbook};

use super::workbook::{MergeRegion, Sheet};
use super::writer::write_cell;
use crate::services::models::CellValue;

pub struct FixtureSheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
    merges: Vec<(u32, u16, u32, u16)>,
}

impl FixtureSheet {
    pub fn new(name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.to_string(),
            rows,
            merges: Vec::new(),
        }
    }

    pub fn with_merge(mut self, first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        self.merges.push((first_row, first_col, last_row, last_col));
        self
    }
}

/// Encode the given sheets as xlsx bytes
pub fn workbook_bytes(sheets: &[FixtureSheet]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for fixture in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&fixture.name).unwrap();

        for (row_idx, row) in fixture.rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                write_cell(
                    worksheet,
                    u32::try_from(row_idx).unwrap(),
                    u16::try_from(col_idx).unwrap(),
                    value,
                    &datetime_format,
                )
                .unwrap();
            }
        }

        for &(first_row, first_col, last_row, last_col) in &fixture.merges {
            worksheet
                .merge_range(first_row, first_col, last_row, last_col, "", &Format::new())
                .unwrap();
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// Build a sheet directly from a calamine grid, without merges
pub fn grid_sheet(name: &str, grid: Vec<Vec<Data>>) -> Sheet {
    grid_sheet_with_merges(name, grid, Vec::new())
}

pub fn grid_sheet_with_merges(name: &str, grid: Vec<Vec<Data>>, merges: Vec<MergeRegion>) -> Sheet {
    let height = grid.len();
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);

    let cells = if height == 0 || width == 0 {
        Range::empty()
    } else {
        let mut range = Range::new(
            (0, 0),
            (
                u32::try_from(height - 1).unwrap(),
                u32::try_from(width - 1).unwrap(),
            ),
        );
        for (row_idx, row) in grid.into_iter().enumerate() {
            for (col_idx, cell) in row.into_iter().enumerate() {
                range.set_value(
                    (
                        u32::try_from(row_idx).unwrap(),
                        u32::try_from(col_idx).unwrap(),
                    ),
                    cell,
                );
            }
        }
        range
    };

    Sheet::new(name, cells, merges)
}
