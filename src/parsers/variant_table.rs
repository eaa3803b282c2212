// ==============================================================================
// variant_table.rs - Source Variant Table Loader
// ==============================================================================
// Description: Loads the CSV variant table into an immutable in-memory snapshot
// Author: Matt Barham
// Created: 2025-11-04
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================
// Format: CSV file with header
// Example:
//   CHROM,POS,REF,ALT,FILTER,DP_total,S1:GT,S1:DP,S1:GQ,S1:AB
//   chr1,100,A,T,,30,0/1,,40,0
// ==============================================================================

use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while loading the variant table
#[derive(Error, Debug)]
pub enum VariantTableError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error at line {line}: {details}")]
    CsvError { line: u64, details: String },

    #[error("Variant table has no header row")]
    MissingHeader,
}

/// Column-addressable variant table, read once and never mutated
#[derive(Debug, Clone)]
pub struct VariantTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<StringRecord>,
}

impl VariantTable {
    /// Load a variant table from a CSV file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, VariantTableError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Load a variant table from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, VariantTableError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(to_table_error)?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(VariantTableError::MissingHeader);
        }

        let mut index = HashMap::with_capacity(headers.len());
        for (position, name) in headers.iter().enumerate() {
            if index.contains_key(name) {
                warn!("Duplicate column '{}' in variant table, using first occurrence", name);
                continue;
            }
            index.insert(name.clone(), position);
        }

        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_table_error)?;

        debug!("Loaded variant table: {} rows x {} columns", rows.len(), headers.len());

        Ok(Self { headers, index, rows })
    }

    /// Column names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Cell at (`row`, `column`); absent cells read as empty
    pub fn value(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|record| record.get(column))
            .unwrap_or("")
    }
}

fn to_table_error(error: csv::Error) -> VariantTableError {
    let line = error.position().map(|p| p.line()).unwrap_or(0);
    VariantTableError::CsvError {
        line,
        details: error.to_string(),
    }
}
