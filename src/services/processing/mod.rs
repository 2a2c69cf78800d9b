pub mod excel_processor;
pub mod mapping;
pub mod row_processing;
pub mod structure;
pub mod utils;
pub mod workbook;
pub mod writer;

#[cfg(test)]
pub mod test_fixtures;

pub use excel_processor::{ExcelProcessor, FileInput, ProcessRequest, ProcessingOutput};
