use crate::config::Config;
use crate::routes::build_router;
use axum::Router;
use tempfile::TempDir;

/// Router backed by a scheme store inside a fresh temporary directory.
///
/// The directory guard must outlive the router.
pub fn setup_test_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = Config::for_tests();
    config.schemes_path = dir.path().join("schemes.json");
    (build_router(&config), dir)
}
