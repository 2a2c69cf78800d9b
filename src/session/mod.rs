//! Interactive mapping session
//!
//! Holds the two loaded files, their selected sheets and headers, and the
//! mapping being built between them. Every operation works on this explicit
//! value; nothing is kept in process-wide state.

use crate::common::errors::{ProcessingError, ProcessingResult};
use crate::schemes::models::Scheme;
use crate::services::data_processing_service::DataProcessingService;
use crate::services::models::{FieldPair, Mapping, SheetIdentifier};
use crate::services::processing::structure::{
    MERGED_CELLS_GUIDANCE, duplicate_headers, has_merged_cells,
};
use crate::services::processing::workbook::{
    Workbook, open_workbook, read_header_row, resolve_sheet, sheet_ordinal,
};
use crate::services::processing::{FileInput, ProcessRequest, ProcessingOutput};
use crate::validation_error;

/// A loaded spreadsheet and the sheet currently chosen from it
#[derive(Debug, Clone)]
pub struct FileSelection {
    name: String,
    bytes: Vec<u8>,
    workbook: Workbook,
    selected_sheet: Option<usize>,
    headers: Vec<String>,
}

impl FileSelection {
    fn open(name: &str, bytes: Vec<u8>) -> ProcessingResult<Self> {
        let workbook = open_workbook(&bytes)?;
        Ok(Self {
            name: name.to_string(),
            bytes,
            workbook,
            selected_sheet: None,
            headers: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sheet_names(&self) -> &[String] {
        self.workbook.sheet_names()
    }

    /// Ordinal of the selected sheet, if one passed the merge check
    pub fn selected_sheet(&self) -> Option<usize> {
        self.selected_sheet
    }

    pub fn selected_sheet_name(&self) -> Option<&str> {
        self.selected_sheet
            .and_then(|idx| self.workbook.sheet_names().get(idx))
            .map(String::as_str)
    }

    /// Ordinal of the sheet `identifier` selects in this file
    pub fn sheet_ordinal(&self, identifier: &SheetIdentifier) -> ProcessingResult<usize> {
        sheet_ordinal(&self.workbook, identifier)
    }

    /// Header names of the selected sheet; empty when none is selected
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn select(&mut self, ordinal: usize, header_scan_rows: usize) -> ProcessingResult<()> {
        self.selected_sheet = None;
        self.headers.clear();

        let sheet = resolve_sheet(&self.workbook, &SheetIdentifier::Index(ordinal))?;
        if has_merged_cells(sheet) {
            return Err(ProcessingError::MergedHeader {
                sheet: sheet.name().to_string(),
                guidance: MERGED_CELLS_GUIDANCE.to_string(),
            });
        }

        let headers = read_header_row(sheet, header_scan_rows);
        if headers.is_empty() {
            tracing::warn!("Sheet '{}' in '{}' has no header names", sheet.name(), self.name);
        } else {
            let duplicates = duplicate_headers(&headers);
            if !duplicates.is_empty() {
                tracing::warn!(
                    "Sheet '{}' repeats header names {duplicates:?}; those columns share one mapping",
                    sheet.name()
                );
            }
            tracing::info!("Loaded {} fields from sheet '{}'", headers.len(), sheet.name());
        }

        self.selected_sheet = Some(ordinal);
        self.headers = headers;
        Ok(())
    }

    fn input(&self) -> Option<FileInput> {
        self.selected_sheet_name().map(|sheet| FileInput {
            name: self.name.clone(),
            bytes: self.bytes.clone(),
            sheet: SheetIdentifier::from(sheet),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Template,
}

impl Side {
    fn label(self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Template => "template",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    service: DataProcessingService,
    source: Option<FileSelection>,
    template: Option<FileSelection>,
    mapping: Mapping,
}

impl Session {
    pub fn new(service: DataProcessingService) -> Self {
        Self {
            service,
            source: None,
            template: None,
            mapping: Mapping::default(),
        }
    }

    pub fn source(&self) -> Option<&FileSelection> {
        self.source.as_ref()
    }

    pub fn template(&self) -> Option<&FileSelection> {
        self.template.as_ref()
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Load the source file and select its first sheet.
    ///
    /// An unreadable file leaves the previous source untouched. If the first
    /// sheet is refused for merged cells the file stays loaded with no sheet
    /// selected.
    pub fn load_source(&mut self, name: &str, bytes: Vec<u8>) -> ProcessingResult<()> {
        self.load(Side::Source, name, bytes)
    }

    /// Load the template file and select its first sheet
    pub fn load_template(&mut self, name: &str, bytes: Vec<u8>) -> ProcessingResult<()> {
        self.load(Side::Template, name, bytes)
    }

    pub fn select_source_sheet(&mut self, ordinal: usize) -> ProcessingResult<()> {
        self.select(Side::Source, ordinal)
    }

    pub fn select_template_sheet(&mut self, ordinal: usize) -> ProcessingResult<()> {
        self.select(Side::Template, ordinal)
    }

    fn slot(&mut self, side: Side) -> &mut Option<FileSelection> {
        match side {
            Side::Source => &mut self.source,
            Side::Template => &mut self.template,
        }
    }

    fn load(&mut self, side: Side, name: &str, bytes: Vec<u8>) -> ProcessingResult<()> {
        let mut selection = FileSelection::open(name, bytes)?;
        tracing::info!(
            "Loaded {} file '{name}' with {} sheet(s)",
            side.label(),
            selection.sheet_names().len()
        );

        self.mapping = Mapping::default();

        if selection.sheet_names().is_empty() {
            tracing::warn!("{} file '{name}' has no sheets", side.label());
        } else if let Err(e) = selection.select(0, self.service.header_scan_rows()) {
            tracing::warn!("First sheet of '{name}' not selected: {e}");
        }

        *self.slot(side) = Some(selection);
        Ok(())
    }

    fn select(&mut self, side: Side, ordinal: usize) -> ProcessingResult<()> {
        let scan_rows = self.service.header_scan_rows();
        self.mapping = Mapping::default();

        let selection = self.slot(side).as_mut().ok_or_else(|| {
            validation_error!(side.label(), "No file loaded")
        })?;
        selection.select(ordinal, scan_rows)
    }

    /// Map `source` onto `template`; each field may take part in one pair
    pub fn add_pair(&mut self, source: &str, template: &str) -> ProcessingResult<()> {
        if self.mapping.is_source_mapped(source) || self.mapping.is_template_mapped(template) {
            return Err(validation_error!(
                "mappings",
                format!("Field already mapped: '{source}' -> '{template}'")
            ));
        }

        tracing::debug!("Mapped '{source}' -> '{template}'");
        self.mapping.0.push(FieldPair::new(source, template));
        Ok(())
    }

    /// Remove the pair drawing from `source`; returns whether one existed
    pub fn remove_pair(&mut self, source: &str) -> bool {
        let before = self.mapping.len();
        self.mapping.0.retain(|pair| pair.source != source);
        self.mapping.len() != before
    }

    fn selections(&self) -> ProcessingResult<(&FileSelection, &FileSelection)> {
        fn selected(slot: Option<&FileSelection>) -> Option<&FileSelection> {
            slot.filter(|s| s.selected_sheet.is_some())
        }

        match (selected(self.source.as_ref()), selected(self.template.as_ref())) {
            (Some(source), Some(template)) => Ok((source, template)),
            _ => Err(validation_error!(
                "session",
                "Load both files and select a sheet in each first"
            )),
        }
    }

    /// Replace the mapping with a saved scheme's pairs.
    ///
    /// Every field the scheme names must be present in the headers of the
    /// currently selected sheets.
    pub fn apply_scheme(&mut self, scheme: &Scheme) -> ProcessingResult<()> {
        let (source, template) = self.selections()?;
        scheme.mappings.validate_unique()?;

        fn missing(required: Vec<&str>, headers: &[String]) -> Vec<String> {
            required
                .into_iter()
                .filter(|name| !headers.iter().any(|h| h == name))
                .map(ToString::to_string)
                .collect()
        }

        let missing_source = missing(scheme.mappings.source_fields(), source.headers());
        if !missing_source.is_empty() {
            return Err(validation_error!(
                "source",
                format!(
                    "Selected source sheet lacks fields required by scheme '{}': {}",
                    scheme.name,
                    missing_source.join(", ")
                )
            ));
        }

        let missing_template = missing(scheme.mappings.template_fields(), template.headers());
        if !missing_template.is_empty() {
            return Err(validation_error!(
                "template",
                format!(
                    "Selected template sheet lacks fields required by scheme '{}': {}",
                    scheme.name,
                    missing_template.join(", ")
                )
            ));
        }

        self.mapping = scheme.mappings.clone();
        tracing::info!("Applied scheme '{}' ({} pairs)", scheme.name, self.mapping.len());
        Ok(())
    }

    /// Capture the current files, sheets and mapping as a named scheme
    pub fn to_scheme(&self, name: &str) -> ProcessingResult<Scheme> {
        let name = name.trim();
        if name.is_empty() {
            return Err(validation_error!("name", "Scheme name must not be empty"));
        }
        let (source, template) = self.selections()?;
        if self.mapping.is_empty() {
            return Err(validation_error!("mappings", "Map at least one field first"));
        }

        Ok(Scheme {
            name: name.to_string(),
            source_file: source.name.clone(),
            template_file: template.name.clone(),
            source_sheet: SheetIdentifier::Index(source.selected_sheet.unwrap_or_default()),
            template_sheet: SheetIdentifier::Index(template.selected_sheet.unwrap_or_default()),
            mappings: self.mapping.clone(),
        })
    }

    /// Convert the selected source sheet into the template layout
    pub fn process(&self) -> ProcessingResult<ProcessingOutput> {
        let (source, template) = self.selections()?;
        if self.mapping.is_empty() {
            return Err(validation_error!("mappings", "Map at least one field first"));
        }

        let request = match (source.input(), template.input()) {
            (Some(source), Some(template)) => ProcessRequest {
                source,
                template,
                mappings: self.mapping.clone(),
            },
            _ => return Err(validation_error!("session", "No sheet selected")),
        };

        self.service.process_files(&request)
    }
}
