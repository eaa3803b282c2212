// ==============================================================================
// models.rs - VCF Conversion Data Models
// ==============================================================================
// Description: Data structures shared by the metadata loader and transformer
// Author: Matt Barham
// Created: 2025-11-12
// Modified: 2026-10-18
// Version: 3.0.0
// ==============================================================================

use std::fmt;

/// Placeholder VCF uses for an absent value
pub const MISSING_VALUE: &str = ".";

/// Header section a metadata column is declared under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Variant-level annotation (`key=value` in the INFO column)
    Info,
    /// Per-sample annotation (colon-joined in each sample column)
    Format,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Info => "INFO",
            Section::Format => "FORMAT",
        }
    }

    /// Parse a section designator exactly as it appears in the metadata table
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "INFO" => Some(Section::Info),
            "FORMAT" => Some(Section::Format),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared column from the metadata table (already sanitized)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column / field identifier (e.g., "DP_total", "GT"), sanitized
    pub id: String,
    /// Identifier exactly as declared (trimmed), matched against table columns
    pub source_id: String,
    pub section: Section,
    /// VCF cardinality, passed through verbatim
    pub number: String,
    /// Declared VCF type (e.g., "Integer", "String")
    pub data_type: String,
    pub description: String,
}

impl ColumnSpec {
    /// Render the `##INFO=<...>` / `##FORMAT=<...>` declaration line
    pub fn declaration(&self) -> String {
        format!(
            "##{}=<ID={},Number={},Type={},Description={}>",
            self.section, self.id, self.number, self.data_type, self.description
        )
    }
}

/// Output row for a single variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcfRow {
    pub chrom: String,
    pub pos: String,
    pub ref_allele: String,
    pub alt_allele: String,
    pub filter: String,
    pub info: String,
    /// Colon-joined FORMAT field list (identical for every row)
    pub format: String,
    /// Encoded genotype string per sample, in sample order
    pub samples: Vec<String>,
}

impl VcfRow {
    /// Constant ID column value
    pub const ID: &'static str = ".";
    /// Constant QUAL column value
    pub const QUAL: &'static str = "0";

    /// All output fields in column order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        [
            self.chrom.as_str(),
            self.pos.as_str(),
            Self::ID,
            self.ref_allele.as_str(),
            self.alt_allele.as_str(),
            Self::QUAL,
            self.filter.as_str(),
            self.info.as_str(),
            self.format.as_str(),
        ]
        .into_iter()
        .chain(self.samples.iter().map(String::as_str))
    }

    /// Tab-separated data line (no trailing newline)
    pub fn to_line(&self) -> String {
        self.fields().collect::<Vec<_>>().join("\t")
    }
}

/// Cell contents the upstream exports use for "no data"
const MISSING_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "<NA>"];

/// Space, tab, CR and LF: none may survive into a tab-delimited VCF line
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Trim, then replace every remaining separator character with `.`
pub fn clean_cell(value: &str) -> String {
    value.trim().replace(is_separator, MISSING_VALUE)
}

/// Replace every space (and tab/CR/LF) with `.`; blank values become `.`
pub fn sanitize_field(value: &str) -> String {
    if value.trim().is_empty() {
        MISSING_VALUE.to_string()
    } else {
        value.replace(is_separator, MISSING_VALUE)
    }
}

/// True for blank cells and the usual NA spellings
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed)
}

/// Data-cell normalization for INFO and FILTER values
pub fn normalize_value(value: &str) -> String {
    if is_missing(value) {
        MISSING_VALUE.to_string()
    } else {
        clean_cell(value)
    }
}
