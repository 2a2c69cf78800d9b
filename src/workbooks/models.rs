use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::processing::structure::duplicate_headers;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetList {
    pub file_name: String,
    pub sheet_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub has_merged_cells: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

/// Header names of a sheet, plus any names that occur more than once
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeaderList {
    pub headers: Vec<String>,
    pub duplicates: Vec<String>,
}

impl HeaderList {
    pub fn new(headers: Vec<String>) -> Self {
        let duplicates = duplicate_headers(&headers);
        Self {
            headers,
            duplicates,
        }
    }
}
