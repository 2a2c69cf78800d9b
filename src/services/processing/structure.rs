//! Sheet structure checks run before headers are read
//!
//! A sheet with merged cells is refused outright: merge detection is not
//! scoped to the header row, any merge anywhere blocks the sheet.

use super::workbook::{MergeRegion, Sheet};

/// Corrective instruction shown when a sheet is refused for merged cells
pub const MERGED_CELLS_GUIDANCE: &str = "Remove all merged cells in Excel, make sure every \
     column has a unique name in the first row, save the file and load it again.";

/// True iff the sheet carries at least one merge region
pub fn has_merged_cells(sheet: &Sheet) -> bool {
    !sheet.merge_regions().is_empty()
}

pub fn merge_regions(sheet: &Sheet) -> &[MergeRegion] {
    sheet.merge_regions()
}

/// Header names that occur more than once, in first-occurrence order
pub fn duplicate_headers(headers: &[String]) -> Vec<String> {
    let mut duplicates: Vec<String> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if headers[..idx].contains(name) && !duplicates.contains(name) {
            duplicates.push(name.clone());
        }
    }
    duplicates
}
