//! File-backed scheme store
//!
//! The whole collection lives in one pretty-printed JSON array. Reads are
//! lenient and never fail; writes replace the file atomically and report
//! failures.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

use super::models::Scheme;
use crate::common::errors::{ProcessingError, ProcessingResult};
use crate::validation_error;

#[derive(Debug, Clone)]
pub struct SchemeStore {
    path: PathBuf,
}

impl SchemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every scheme; a missing, empty or corrupt store yields no schemes.
    ///
    /// Records that are not valid schemes are skipped individually.
    pub fn load_all(&self) -> Vec<Scheme> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No scheme store at {}, starting empty", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Failed to read scheme store {}: {e}", self.path.display());
                return Vec::new();
            }
        };

        if data.trim().is_empty() {
            return Vec::new();
        }

        let records: Vec<Value> = match serde_json::from_str(&data) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Scheme store {} is not a JSON array: {e}", self.path.display());
                return Vec::new();
            }
        };

        let schemes: Vec<Scheme> = records
            .into_iter()
            .enumerate()
            .filter_map(|(idx, record)| match serde_json::from_value(record) {
                Ok(scheme) => Some(scheme),
                Err(e) => {
                    tracing::warn!("Skipping scheme record {idx}: {e}");
                    None
                }
            })
            .collect();

        tracing::debug!("Loaded {} schemes from {}", schemes.len(), self.path.display());
        schemes
    }

    /// Replace the stored collection with `schemes`
    pub fn save_all(&self, schemes: &[Scheme]) -> ProcessingResult<()> {
        let data = serde_json::to_string_pretty(schemes).map_err(persistence)?;

        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(persistence)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(persistence)?;
        tmp.write_all(data.as_bytes()).map_err(persistence)?;
        tmp.persist(&self.path).map_err(|e| persistence(e.error))?;

        tracing::info!("Saved {} schemes to {}", schemes.len(), self.path.display());
        Ok(())
    }
}

/// Replace the scheme with the same name, or append it
pub fn upsert_scheme(schemes: &mut Vec<Scheme>, mut scheme: Scheme) -> ProcessingResult<()> {
    scheme.name = scheme.name.trim().to_string();
    if scheme.name.is_empty() {
        return Err(validation_error!("name", "Scheme name must not be empty"));
    }
    scheme.mappings.validate_unique()?;

    match schemes.iter().position(|s| s.name == scheme.name) {
        Some(idx) => schemes[idx] = scheme,
        None => schemes.push(scheme),
    }
    Ok(())
}

/// Drop the scheme named `name`; returns whether one was removed
pub fn remove_scheme(schemes: &mut Vec<Scheme>, name: &str) -> bool {
    let before = schemes.len();
    schemes.retain(|s| s.name != name);
    schemes.len() != before
}

pub fn find_scheme<'a>(schemes: &'a [Scheme], name: &str) -> Option<&'a Scheme> {
    schemes.iter().find(|s| s.name == name)
}

#[allow(clippy::needless_pass_by_value)]
fn persistence(e: impl std::error::Error) -> ProcessingError {
    ProcessingError::PersistenceError {
        message: e.to_string(),
    }
}
