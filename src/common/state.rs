use crate::config::Config;
use crate::schemes::store::SchemeStore;
use crate::services::data_processing_service::DataProcessingService;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub data_processing_service: DataProcessingService,
    // Serialises load-modify-save sequences against the store file
    pub scheme_store: Arc<Mutex<SchemeStore>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            data_processing_service: DataProcessingService::new(config.header_scan_rows),
            scheme_store: Arc::new(Mutex::new(SchemeStore::new(config.schemes_path.clone()))),
            config,
        }
    }
}
