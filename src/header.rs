// ==============================================================================
// header.rs - VCF Header Block
// ==============================================================================
// Description: Fixed meta lines plus metadata declarations, in output order
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use chrono::NaiveDate;

use crate::parsers::ColumnMetadata;

pub const VCF_VERSION: &str = "VCFv4.2";
pub const DEFAULT_REFERENCE: &str = "hg38";

/// Fixed data columns, as named on the optional `#CHROM` line
pub const FIXED_HEADER_COLUMNS: [&str; 9] = [
    "#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO", "FORMAT",
];

/// Lines written before any data row
///
/// Order: file format, date, source file, reference, then one declaration per
/// metadata column in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock {
    lines: Vec<String>,
}

impl HeaderBlock {
    pub fn new(
        date: NaiveDate,
        source_file: &str,
        reference: &str,
        metadata: &ColumnMetadata,
    ) -> Self {
        let mut lines = vec![
            format!("##fileformat={}", VCF_VERSION),
            format!("##date={}", date.format("%d%m%y")),
            format!("##sourcefile={}", source_file),
            format!("##reference={}", reference),
        ];
        lines.extend(metadata.declaration_lines());
        Self { lines }
    }

    /// Header dated today (local time)
    pub fn today(source_file: &str, reference: &str, metadata: &ColumnMetadata) -> Self {
        Self::new(chrono::Local::now().date_naive(), source_file, reference, metadata)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// `#CHROM POS ID REF ALT QUAL FILTER INFO FORMAT <samples...>`
pub fn column_header_line(samples: &[String]) -> String {
    FIXED_HEADER_COLUMNS
        .iter()
        .copied()
        .chain(samples.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("\t")
}
