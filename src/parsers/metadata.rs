// ==============================================================================
// metadata.rs - Column Metadata Parser
// ==============================================================================
// Description: Loads the column-description table that drives VCF encoding
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================
// Format: CSV file with header
// Example:
//   ID,type,Number,Dtype,Description
//   DP_total,INFO,1,Integer,Total read depth
//   GT,FORMAT,1,String,Genotype
// ==============================================================================

use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::models::{sanitize_field, ColumnSpec, Section};

/// Required metadata columns and the header names accepted for each
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("ID", &["ID"]),
    ("type", &["type", "Section"]),
    ("Number", &["Number"]),
    ("Dtype", &["Dtype", "DataType", "Type"]),
    ("Description", &["Description"]),
];

/// Raw metadata row as it appears in the CSV
#[derive(Debug, Deserialize)]
struct MetadataRow {
    #[serde(rename = "ID")]
    id: String,

    #[serde(rename = "type", alias = "Section")]
    section: String,

    #[serde(rename = "Number")]
    number: String,

    #[serde(rename = "Dtype", alias = "DataType", alias = "Type")]
    data_type: String,

    #[serde(rename = "Description")]
    description: String,
}

/// Errors that can occur while loading the metadata table
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Metadata parse error: required column '{0}' is missing")]
    MissingColumn(&'static str),

    #[error("Metadata parse error at row {row}: {details}")]
    Parse { row: usize, details: String },

    #[error("Metadata format error at row {row}: {details}")]
    Format { row: usize, details: String },
}

/// Declared columns, in metadata order
#[derive(Debug, Clone, Default)]
pub struct ColumnMetadata {
    pub columns: Vec<ColumnSpec>,
}

impl ColumnMetadata {
    /// `##INFO=<...>` / `##FORMAT=<...>` lines in declared order
    pub fn declaration_lines(&self) -> Vec<String> {
        self.columns.iter().map(ColumnSpec::declaration).collect()
    }

    /// INFO columns in declared order
    pub fn info_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.section == Section::Info)
    }

    pub fn info_ids(&self) -> Vec<String> {
        self.ids_in(Section::Info)
    }

    pub fn format_ids(&self) -> Vec<String> {
        self.ids_in(Section::Format)
    }

    fn ids_in(&self, section: Section) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.section == section)
            .map(|c| c.id.clone())
            .collect()
    }
}

/// Metadata table parser
pub struct MetadataParser;

impl MetadataParser {
    /// Parse the metadata table from a CSV file
    ///
    /// # Arguments
    /// * `path` - Path to the column-description CSV
    ///
    /// # Returns
    /// * `Ok(ColumnMetadata)` - Sanitized column specs in file order
    /// * `Err(MetadataError)` - Missing column, malformed row or unknown section
    pub fn parse(path: impl AsRef<Path>) -> Result<ColumnMetadata, MetadataError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Parse the metadata table from any reader
    ///
    /// Every space inside a field is replaced with `.`; blank cells become `.`.
    /// `Number` is carried through opaquely.
    pub fn from_reader<R: Read>(reader: R) -> Result<ColumnMetadata, MetadataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers().map_err(|e| csv_error(0, e))?.clone();
        for &(canonical, accepted) in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| accepted.contains(&h)) {
                return Err(MetadataError::MissingColumn(canonical));
            }
        }

        let mut columns = Vec::new();
        let mut seen: HashSet<(Section, String)> = HashSet::new();

        for (idx, result) in reader.deserialize::<MetadataRow>().enumerate() {
            // Row 1 is the header
            let row_number = idx + 2;
            let row = result.map_err(|e| csv_error(row_number, e))?;

            let id = row.id.trim();
            if id.is_empty() {
                return Err(MetadataError::Parse {
                    row: row_number,
                    details: "empty ID".to_string(),
                });
            }

            let section = Section::parse(&row.section).ok_or_else(|| MetadataError::Format {
                row: row_number,
                details: format!(
                    "section must be INFO or FORMAT, found '{}'",
                    row.section.trim()
                ),
            })?;

            let source_id = id.to_string();
            let id = sanitize_field(id);
            if !seen.insert((section, id.clone())) {
                return Err(MetadataError::Format {
                    row: row_number,
                    details: format!("duplicate {} ID '{}'", section, id),
                });
            }

            columns.push(ColumnSpec {
                id,
                source_id,
                section,
                number: sanitize_field(&row.number),
                data_type: sanitize_field(&row.data_type),
                description: sanitize_field(&row.description),
            });
        }

        debug!(
            "Loaded {} metadata columns ({} INFO, {} FORMAT)",
            columns.len(),
            columns.iter().filter(|c| c.section == Section::Info).count(),
            columns.iter().filter(|c| c.section == Section::Format).count()
        );

        Ok(ColumnMetadata { columns })
    }
}

fn csv_error(row: usize, error: csv::Error) -> MetadataError {
    MetadataError::Parse {
        row,
        details: error.to_string(),
    }
}
