use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};
use utoipa::ToSchema;

use crate::services::models::{Mapping, SheetIdentifier};

/// A saved, named mapping between a source sheet and a template sheet.
///
/// File names are display names only; a scheme is reapplied to whichever
/// files are currently loaded. Everything but `name` is optional on load,
/// and an explicit `null` reads as the default.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Scheme {
    pub name: String,
    #[serde(default, alias = "sourceFileDisplayName")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub source_file: String,
    #[serde(default, alias = "templateFileDisplayName")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub template_file: String,
    #[serde(default, alias = "sourceSheetIdentifier")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub source_sheet: SheetIdentifier,
    #[serde(default, alias = "templateSheetIdentifier")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub template_sheet: SheetIdentifier,
    #[serde(default, alias = "mapping")]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub mappings: Mapping,
}
