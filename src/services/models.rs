use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use utoipa::ToSchema;

use crate::common::errors::ProcessingResult;
use crate::validation_error;

/// Scalar value of a single spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// A data row keyed by column name
pub type SourceRow = HashMap<String, CellValue>;

/// A projected row keyed by template column name
pub type OutputRow = HashMap<String, CellValue>;

/// Selects a sheet either by zero-based ordinal or by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SheetIdentifier {
    Index(usize),
    Name(String),
}

impl fmt::Display for SheetIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetIdentifier::Index(index) => write!(f, "{index}"),
            SheetIdentifier::Name(name) => f.write_str(name),
        }
    }
}

impl Default for SheetIdentifier {
    fn default() -> Self {
        SheetIdentifier::Index(0)
    }
}

impl From<usize> for SheetIdentifier {
    fn from(index: usize) -> Self {
        SheetIdentifier::Index(index)
    }
}

impl From<&str> for SheetIdentifier {
    fn from(name: &str) -> Self {
        SheetIdentifier::Name(name.to_string())
    }
}

/// One source-field to template-field assignment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct FieldPair {
    pub source: String,
    pub template: String,
}

impl FieldPair {
    pub fn new(source: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            template: template.into(),
        }
    }
}

/// Ordered list of field pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Mapping(pub Vec<FieldPair>);

impl Mapping {
    pub fn new(pairs: Vec<FieldPair>) -> Self {
        Self(pairs)
    }

    pub fn pairs(&self) -> &[FieldPair] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_source_mapped(&self, source: &str) -> bool {
        self.0.iter().any(|pair| pair.source == source)
    }

    pub fn is_template_mapped(&self, template: &str) -> bool {
        self.0.iter().any(|pair| pair.template == template)
    }

    /// Distinct source names in first-occurrence order
    pub fn source_fields(&self) -> Vec<&str> {
        distinct(self.0.iter().map(|pair| pair.source.as_str()))
    }

    /// Distinct template names in first-occurrence order
    pub fn template_fields(&self) -> Vec<&str> {
        distinct(self.0.iter().map(|pair| pair.template.as_str()))
    }

    /// First pair whose source or template repeats an earlier pair's.
    pub fn first_conflict(&self) -> Option<&FieldPair> {
        self.0.iter().enumerate().find_map(|(idx, pair)| {
            self.0
                .iter()
                .take(idx)
                .any(|earlier| earlier.source == pair.source || earlier.template == pair.template)
                .then_some(pair)
        })
    }

    /// Reject a mapping in which a source or template field is used twice
    pub fn validate_unique(&self) -> ProcessingResult<()> {
        match self.first_conflict() {
            Some(pair) => Err(validation_error!(
                "mappings",
                format!(
                    "Field already mapped: '{}' -> '{}'",
                    pair.source, pair.template
                )
            )),
            None => Ok(()),
        }
    }
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}
