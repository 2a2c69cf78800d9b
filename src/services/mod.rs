pub mod data_processing_service;
pub mod models;
pub mod processing;
