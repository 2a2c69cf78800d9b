use super::models::SheetIdentifier;
use super::processing::{
    ExcelProcessor, ProcessRequest, ProcessingOutput,
    structure::{duplicate_headers, has_merged_cells},
    workbook::{list_sheet_names, open_workbook, read_header_row, resolve_sheet},
};
use crate::common::errors::ProcessingResult;

/// Service for the workbook operations a front end calls.
///
/// Opening a file and processing are strict and return typed failures.
/// Merge detection and header reads are pre-flight reads: any failure is
/// logged and degrades to `false` / an empty list.
#[derive(Debug, Clone, Copy)]
pub struct DataProcessingService {
    processor: ExcelProcessor,
    header_scan_rows: usize,
}

impl DataProcessingService {
    pub fn new(header_scan_rows: usize) -> Self {
        Self {
            processor: ExcelProcessor::new(header_scan_rows),
            header_scan_rows,
        }
    }

    pub fn header_scan_rows(&self) -> usize {
        self.header_scan_rows
    }

    /// Open a workbook and list its sheet names
    pub fn open_and_list_sheets(&self, bytes: &[u8]) -> ProcessingResult<Vec<String>> {
        let workbook = open_workbook(bytes)?;
        Ok(list_sheet_names(&workbook))
    }

    /// Whether the selected sheet has merged cells; `false` on any read error
    pub fn detect_merges(&self, bytes: &[u8], sheet: &SheetIdentifier) -> bool {
        let result = open_workbook(bytes).and_then(|workbook| {
            resolve_sheet(&workbook, sheet).map(has_merged_cells)
        });

        result.unwrap_or_else(|e| {
            tracing::warn!("Merge detection failed for sheet '{sheet}': {e}");
            false
        })
    }

    /// Header names of the selected sheet; empty on any read error.
    ///
    /// `max_rows` overrides the configured scan cap.
    pub fn read_headers(
        &self,
        bytes: &[u8],
        sheet: &SheetIdentifier,
        max_rows: Option<usize>,
    ) -> Vec<String> {
        let scan_rows = max_rows.unwrap_or(self.header_scan_rows);
        let result = open_workbook(bytes)
            .and_then(|workbook| resolve_sheet(&workbook, sheet).map(|s| read_header_row(s, scan_rows)));

        match result {
            Ok(headers) => {
                let duplicates = duplicate_headers(&headers);
                if !duplicates.is_empty() {
                    tracing::warn!(
                        "Sheet '{sheet}' repeats header names {duplicates:?}; those columns share one mapping"
                    );
                }
                headers
            }
            Err(e) => {
                tracing::warn!("Reading headers failed for sheet '{sheet}': {e}");
                Vec::new()
            }
        }
    }

    /// Convert the source sheet into the template layout
    pub fn process_files(&self, request: &ProcessRequest) -> ProcessingResult<ProcessingOutput> {
        self.processor.process(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::ProcessingError;
    use crate::services::models::CellValue;
    use crate::services::processing::test_fixtures::{FixtureSheet, workbook_bytes};

    fn s(text: &str) -> CellValue {
        CellValue::String(text.to_string())
    }

    fn bytes() -> Vec<u8> {
        workbook_bytes(&[
            FixtureSheet::new("Clean", vec![vec![s("A"), s("B")]]),
            FixtureSheet::new("Merged", vec![vec![s("A"), s("B")]]).with_merge(5, 0, 5, 3),
        ])
    }

    #[test]
    fn test_open_and_list_sheets() {
        let service = DataProcessingService::new(5);
        assert_eq!(
            service.open_and_list_sheets(&bytes()).unwrap(),
            vec!["Clean", "Merged"]
        );
        assert!(matches!(
            service.open_and_list_sheets(b"nope"),
            Err(ProcessingError::UnreadableFile { .. })
        ));
    }

    #[test]
    fn test_detect_merges_is_lenient() {
        let service = DataProcessingService::new(5);
        let data = bytes();

        assert!(!service.detect_merges(&data, &SheetIdentifier::Index(0)));
        assert!(service.detect_merges(&data, &SheetIdentifier::from("Merged")));
        assert!(!service.detect_merges(&data, &SheetIdentifier::from("Missing")));
        assert!(!service.detect_merges(b"garbage", &SheetIdentifier::Index(0)));
    }

    #[test]
    fn test_read_headers_is_lenient() {
        let service = DataProcessingService::new(5);
        let data = bytes();

        assert_eq!(
            service.read_headers(&data, &SheetIdentifier::Index(0), None),
            vec!["A", "B"]
        );
        assert!(service
            .read_headers(&data, &SheetIdentifier::Index(7), None)
            .is_empty());
        assert!(service
            .read_headers(b"garbage", &SheetIdentifier::Index(0), None)
            .is_empty());
        assert!(service
            .read_headers(&data, &SheetIdentifier::Index(0), Some(0))
            .is_empty());
    }
}
