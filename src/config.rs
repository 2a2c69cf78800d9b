use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

const DEFAULT_HEADER_SCAN_ROWS: usize = 5;
const DEFAULT_MAX_UPLOAD_MB: usize = 30;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub deployment: String,
    pub bind_addr: String,
    pub schemes_path: PathBuf,
    pub header_scan_rows: usize,
    pub max_upload_mb: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok(); // Load from .env file if available

        Config {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "sheet-mapper".to_string()),
            deployment: env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            schemes_path: env::var("SCHEMES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_schemes_path()),
            header_scan_rows: parse_env_or("HEADER_SCAN_ROWS", DEFAULT_HEADER_SCAN_ROWS),
            max_upload_mb: parse_env_or("MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            app_name: "sheet-mapper-test".to_string(),
            deployment: "test".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            schemes_path: env::temp_dir().join("sheet-mapper-test").join("schemes.json"),
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

fn parse_env_or(key: &str, default: usize) -> usize {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {key}={raw:?}, using {default}");
            default
        }),
        Err(_) => default,
    }
}

/// Per-user location of the scheme store.
fn default_schemes_path() -> PathBuf {
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));

    match base {
        Some(dir) => dir.join("sheet-mapper").join("schemes.json"),
        None => PathBuf::from("schemes.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_tests_defaults() {
        let config = Config::for_tests();
        assert_eq!(config.header_scan_rows, 5);
        assert_eq!(config.max_upload_bytes(), 30 * 1024 * 1024);
        assert!(config.schemes_path.ends_with("schemes.json"));
    }

    #[test]
    fn test_default_schemes_path_is_per_user_file() {
        let path = default_schemes_path();
        assert_eq!(path.file_name().unwrap(), "schemes.json");
    }
}
