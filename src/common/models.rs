use crate::config::Config;
use crate::services::processing::writer::OUTPUT_SHEET_NAME;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Serialize, Default)]
pub struct UIConfiguration {
    #[serde(rename = "appName")]
    pub app_name: String,
    pub deployment: String,
    #[serde(rename = "headerScanRows")]
    pub header_scan_rows: usize,
    #[serde(rename = "outputSheetName")]
    pub output_sheet_name: String,
}

impl UIConfiguration {
    pub fn new(config: &Config) -> Self {
        Self {
            app_name: config.app_name.clone(),
            deployment: config.deployment.clone(),
            header_scan_rows: config.header_scan_rows,
            output_sheet_name: OUTPUT_SHEET_NAME.to_string(),
        }
    }
}

#[derive(ToSchema, Deserialize, Serialize)]
pub struct HealthCheck {
    pub status: String,
}
