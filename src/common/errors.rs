use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Blocking failures of the mapping engine. These abort the current operation
/// and are reported to the caller; the session stays usable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    /// The bytes are not a readable spreadsheet container (400 Bad Request)
    UnreadableFile { message: String },
    /// No sheet matches the identifier by name or ordinal (404 Not Found)
    SheetNotFound { identifier: String },
    /// The template sheet has no usable header row (422 Unprocessable Entity)
    EmptyTemplateHeader { sheet: String },
    /// The sheet carries merged cells and cannot be mapped (422 Unprocessable Entity)
    MergedHeader { sheet: String, guidance: String },
    /// Caller input rejected before any work was done (400 Bad Request)
    ValidationError { field: String, message: String },
    /// The output workbook could not be encoded (500 Internal Server Error)
    SerializationError { message: String },
    /// The scheme store could not be written (500 Internal Server Error)
    PersistenceError { message: String },
}

impl ProcessingError {
    fn code(&self) -> &'static str {
        match self {
            ProcessingError::UnreadableFile { .. } => "UNREADABLE_FILE",
            ProcessingError::SheetNotFound { .. } => "SHEET_NOT_FOUND",
            ProcessingError::EmptyTemplateHeader { .. } => "EMPTY_TEMPLATE_HEADER",
            ProcessingError::MergedHeader { .. } => "MERGED_HEADER",
            ProcessingError::ValidationError { .. } => "VALIDATION_ERROR",
            ProcessingError::SerializationError { .. } => "SERIALIZATION_ERROR",
            ProcessingError::PersistenceError { .. } => "PERSISTENCE_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ProcessingError::UnreadableFile { .. } | ProcessingError::ValidationError { .. } => {
                StatusCode::BAD_REQUEST
            }
            ProcessingError::SheetNotFound { .. } => StatusCode::NOT_FOUND,
            ProcessingError::EmptyTemplateHeader { .. } | ProcessingError::MergedHeader { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ProcessingError::SerializationError { .. }
            | ProcessingError::PersistenceError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingError::UnreadableFile { message } => {
                write!(f, "File is not a readable spreadsheet: {message}")
            }
            ProcessingError::SheetNotFound { identifier } => {
                write!(f, "Sheet '{identifier}' not found")
            }
            ProcessingError::EmptyTemplateHeader { sheet } => {
                write!(f, "Template sheet '{sheet}' has an empty header row")
            }
            ProcessingError::MergedHeader { sheet, guidance } => {
                write!(f, "Sheet '{sheet}' contains merged cells. {guidance}")
            }
            ProcessingError::ValidationError { field, message } => {
                write!(f, "Validation error in field '{field}': {message}")
            }
            ProcessingError::SerializationError { message } => {
                write!(f, "Failed to write output workbook: {message}")
            }
            ProcessingError::PersistenceError { message } => {
                write!(f, "Failed to save schemes: {message}")
            }
        }
    }
}

impl std::error::Error for ProcessingError {}

/// Convert `ProcessingError` to HTTP responses
impl IntoResponse for ProcessingError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "type": format!("{self:?}").split(' ').next().unwrap_or("Unknown")
            }
        }));

        (status, body).into_response()
    }
}

/// Convenience macro for caller-input errors
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        $crate::common::errors::ProcessingError::ValidationError {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
}

/// Result type alias for strict engine operations
pub type ProcessingResult<T> = Result<T, ProcessingError>;
