use axum::{
    Json,
    extract::{Multipart, State},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::collections::HashMap;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::models::{HeaderList, MergeReport, SheetList};
use crate::common::errors::ProcessingError;
use crate::common::state::AppState;
use crate::services::models::{Mapping, SheetIdentifier};
use crate::services::processing::structure::MERGED_CELLS_GUIDANCE;
use crate::services::processing::{FileInput, ProcessRequest};
use crate::validation_error;

/// RFC 5987 `attr-char` minus the few marks some clients mishandle
const ATTR_CHARS: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_sheets))
        .routes(routes!(detect_merges))
        .routes(routes!(read_headers))
        .routes(routes!(process_files))
        .with_state(state.clone())
}

#[derive(Debug)]
struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

/// Files and text fields of a multipart request, by field name
#[derive(Debug, Default)]
struct UploadForm {
    files: HashMap<String, UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ProcessingError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| validation_error!("multipart", e))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            if let Some(file_name) = field.file_name().map(ToString::to_string) {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| validation_error!(field_name, e))?
                    .to_vec();
                form.files.insert(
                    field_name,
                    UploadedFile {
                        name: file_name,
                        bytes,
                    },
                );
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| validation_error!(field_name, e))?;
                form.fields.insert(field_name, text);
            }
        }

        Ok(form)
    }

    fn take_file(&mut self, field: &str) -> Result<UploadedFile, ProcessingError> {
        self.files
            .remove(field)
            .ok_or_else(|| validation_error!(field, "No file found in request"))
    }

    fn sheet(&self, field: &str) -> Result<SheetIdentifier, ProcessingError> {
        self.fields
            .get(field)
            .map(|text| SheetIdentifier::Name(text.clone()))
            .ok_or_else(|| validation_error!(field, "Sheet identifier is required"))
    }

    fn optional_usize(&self, field: &str) -> Result<Option<usize>, ProcessingError> {
        self.fields
            .get(field)
            .map(|text| {
                text.trim()
                    .parse()
                    .map_err(|_| validation_error!(field, "Must be a non-negative integer"))
            })
            .transpose()
    }
}

/// Open a workbook and list its sheets
#[utoipa::path(
    post,
    path = "/sheets",
    request_body(content = String, description = "Workbook as multipart/form-data field `file`", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Sheet names in workbook order", body = SheetList),
        (status = 400, description = "Missing file or unreadable spreadsheet")
    ),
    tag = "workbooks"
)]
pub async fn list_sheets(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SheetList>, ProcessingError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file("file")?;
    let service = state.data_processing_service;

    let file_name = file.name.clone();
    let sheet_names =
        tokio::task::spawn_blocking(move || service.open_and_list_sheets(&file.bytes))
            .await
            .map_err(|e| ProcessingError::UnreadableFile {
                message: format!("Worker failed: {e}"),
            })??;

    tracing::info!("Opened '{file_name}' with {} sheet(s)", sheet_names.len());
    Ok(Json(SheetList {
        file_name,
        sheet_names,
    }))
}

/// Check a sheet for merged cells; read failures report `false`
#[utoipa::path(
    post,
    path = "/merges",
    request_body(content = String, description = "Multipart fields `file` and `sheet`", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Merge check result", body = MergeReport),
        (status = 400, description = "Missing file or sheet field")
    ),
    tag = "workbooks"
)]
pub async fn detect_merges(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MergeReport>, ProcessingError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file("file")?;
    let sheet = form.sheet("sheet")?;
    let service = state.data_processing_service;

    let has_merged_cells =
        tokio::task::spawn_blocking(move || service.detect_merges(&file.bytes, &sheet))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Merge detection worker failed: {e}");
                false
            });

    Ok(Json(MergeReport {
        has_merged_cells,
        guidance: has_merged_cells.then(|| MERGED_CELLS_GUIDANCE.to_string()),
    }))
}

/// Read the header row of a sheet; read failures report no headers
#[utoipa::path(
    post,
    path = "/headers",
    request_body(content = String, description = "Multipart fields `file`, `sheet` and optional `max_rows`", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Header names, possibly empty", body = HeaderList),
        (status = 400, description = "Missing file or sheet field")
    ),
    tag = "workbooks"
)]
pub async fn read_headers(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<HeaderList>, ProcessingError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file("file")?;
    let sheet = form.sheet("sheet")?;
    let max_rows = form.optional_usize("max_rows")?;
    let service = state.data_processing_service;

    let headers =
        tokio::task::spawn_blocking(move || service.read_headers(&file.bytes, &sheet, max_rows))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Header worker failed: {e}");
                Vec::new()
            });

    Ok(Json(HeaderList::new(headers)))
}

/// Convert a source sheet into the template layout and return the new workbook
#[utoipa::path(
    post,
    path = "/process",
    request_body(content = String, description = "Multipart fields `source_file`, `source_sheet`, `template_file`, `template_sheet` and `mappings` (JSON array of {source, template})", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Converted workbook as an xlsx attachment", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Invalid request or unreadable spreadsheet"),
        (status = 404, description = "Sheet not found"),
        (status = 422, description = "Template header row is empty"),
        (status = 500, description = "Output workbook could not be written")
    ),
    tag = "workbooks"
)]
pub async fn process_files(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ProcessingError> {
    let mut form = UploadForm::read(multipart).await?;

    let source = form.take_file("source_file")?;
    let template = form.take_file("template_file")?;
    let mappings_json = form
        .fields
        .get("mappings")
        .ok_or_else(|| validation_error!("mappings", "Mapping list is required"))?;
    let mappings: Mapping = serde_json::from_str(mappings_json)
        .map_err(|e| validation_error!("mappings", e))?;

    let request = ProcessRequest {
        source: FileInput {
            name: source.name,
            bytes: source.bytes,
            sheet: form.sheet("source_sheet")?,
        },
        template: FileInput {
            name: template.name,
            bytes: template.bytes,
            sheet: form.sheet("template_sheet")?,
        },
        mappings,
    };

    let service = state.data_processing_service;
    let output = tokio::task::spawn_blocking(move || service.process_files(&request))
        .await
        .map_err(|e| ProcessingError::SerializationError {
            message: format!("Worker failed: {e}"),
        })??;

    let disposition = content_disposition(&output.output_file_name);
    let mut response = (
        StatusCode::OK,
        [(CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()), (CONTENT_DISPOSITION, disposition)],
        output.output_bytes,
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert("x-row-count", HeaderValue::from(output.row_count));
    headers.insert(
        "x-output-column-count",
        HeaderValue::from(output.output_column_count),
    );
    headers.insert(
        "x-processing-time-ms",
        HeaderValue::from(u64::try_from(output.processing_time_ms).unwrap_or(u64::MAX)),
    );

    Ok(response)
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let encoded = utf8_percent_encode(file_name, ATTR_CHARS);

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
