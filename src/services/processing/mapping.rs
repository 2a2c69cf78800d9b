//! Mapping resolution
//!
//! Folds the ordered field pairs into a template-name lookup and lays it out
//! in the template's header order.

use std::collections::HashMap;

use crate::services::models::Mapping;

/// One output column and the source column it draws from, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub template: String,
    pub source: Option<String>,
}

/// Output columns in template header order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMapping {
    columns: Vec<ResolvedColumn>,
}

impl ResolvedMapping {
    pub fn columns(&self) -> &[ResolvedColumn] {
        &self.columns
    }

    /// Template column names, in output order
    pub fn output_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.template.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of output columns that draw from a source column
    pub fn mapped_count(&self) -> usize {
        self.columns.iter().filter(|c| c.source.is_some()).count()
    }
}

/// Resolve `mapping` against the template's header order.
///
/// Pairs naming the same template field collapse to the last one. Duplicate
/// template header names share one lookup key and therefore one source.
pub fn resolve(mapping: &Mapping, template_headers: &[String]) -> ResolvedMapping {
    let lookup: HashMap<&str, &str> = mapping
        .pairs()
        .iter()
        .map(|pair| (pair.template.as_str(), pair.source.as_str()))
        .collect();

    let columns = template_headers
        .iter()
        .map(|template| ResolvedColumn {
            template: template.clone(),
            source: lookup.get(template.as_str()).map(|source| (*source).to_string()),
        })
        .collect();

    ResolvedMapping { columns }
}
