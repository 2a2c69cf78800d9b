//! Excel processor for mapping conversions
//!
//! Runs the full conversion: read the source rows, read the template header,
//! resolve the mapping, project the rows and encode the output workbook.
//! Every step is strict; the first failure aborts the whole conversion.

use std::path::Path;
use std::time::Instant;

use super::{
    mapping::resolve,
    row_processing::project,
    workbook::{open_workbook, read_all_rows, read_header_row, resolve_sheet},
    writer::write_workbook,
};
use crate::common::errors::{ProcessingError, ProcessingResult};
use crate::services::models::{Mapping, SheetIdentifier};

/// A spreadsheet file held in memory together with the sheet to use
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub bytes: Vec<u8>,
    pub sheet: SheetIdentifier,
}

#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub source: FileInput,
    pub template: FileInput,
    pub mappings: Mapping,
}

/// Result of a conversion
#[derive(Debug, Clone)]
pub struct ProcessingOutput {
    pub output_column_count: usize,
    pub row_count: usize,
    pub output_bytes: Vec<u8>,
    pub output_file_name: String,
    pub processing_time_ms: u128,
}

/// Stateless conversion pipeline
#[derive(Debug, Clone, Copy)]
pub struct ExcelProcessor {
    header_scan_rows: usize,
}

impl ExcelProcessor {
    pub fn new(header_scan_rows: usize) -> Self {
        Self { header_scan_rows }
    }

    pub fn process(&self, request: &ProcessRequest) -> ProcessingResult<ProcessingOutput> {
        let start_time = Instant::now();

        let source_workbook = open_workbook(&request.source.bytes)?;
        let source_sheet = resolve_sheet(&source_workbook, &request.source.sheet)?;
        let source_rows = read_all_rows(source_sheet, self.header_scan_rows);

        let template_workbook = open_workbook(&request.template.bytes)?;
        let template_sheet = resolve_sheet(&template_workbook, &request.template.sheet)?;
        let template_headers = read_header_row(template_sheet, self.header_scan_rows);
        if template_headers.is_empty() {
            return Err(ProcessingError::EmptyTemplateHeader {
                sheet: template_sheet.name().to_string(),
            });
        }

        let resolved = resolve(&request.mappings, &template_headers);
        tracing::debug!(
            "Resolved {} of {} template columns from {} pairs",
            resolved.mapped_count(),
            resolved.len(),
            request.mappings.len()
        );

        let output_rows = project(&resolved, &source_rows);
        let output_bytes = write_workbook(&resolved.output_columns(), &output_rows)?;

        let processing_time_ms = start_time.elapsed().as_millis();
        tracing::info!(
            "Converted {} rows from '{}' into {} template columns in {processing_time_ms}ms",
            output_rows.len(),
            source_sheet.name(),
            resolved.len(),
        );

        Ok(ProcessingOutput {
            output_column_count: resolved.len(),
            row_count: output_rows.len(),
            output_bytes,
            output_file_name: converted_file_name(&request.source.name),
            processing_time_ms,
        })
    }
}

/// Default output name for a source file: `Converted_<stem>.xlsx`
pub fn converted_file_name(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("output");
    format!("Converted_{stem}.xlsx")
}
