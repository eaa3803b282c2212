// ==============================================================================
// genotype_encoder.rs - Per-Sample Genotype Field Encoding
// ==============================================================================
// Description: Encodes a sample's GT/DP/GQ/AB columns into VCF sample strings
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================
// Encoding rules (fields joined with ':' in fixed order GT:DP:GQ:AB):
//   - GT missing or blank          → "./."
//   - DP / GQ missing              → -1 sentinel → "."
//   - DP / GQ numeric              → integer text ("7", "7.0" → "7")
//   - AB numerically zero          → "." (zero collapses to "not applicable")
//   - anything else still missing  → "."
// ==============================================================================

use thiserror::Error;

use crate::models::{clean_cell, is_missing, MISSING_VALUE};
use crate::parsers::VariantTable;

/// Sub-fields every sample must provide, in output order
pub const SAMPLE_FIELDS: [&str; 4] = ["GT", "DP", "GQ", "AB"];

/// Integer stand-in for a missing DP/GQ value
pub const MISSING_SENTINEL: i64 = -1;

/// Genotype written when GT is absent
pub const MISSING_GENOTYPE: &str = "./.";

/// Errors that can occur while encoding a sample column
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenotypeEncodingError {
    #[error("Sample '{sample}' row {row}: {field} value '{value}' is not a valid integer")]
    InvalidInteger {
        sample: String,
        row: usize,
        field: &'static str,
        value: String,
    },
}

/// Column positions of one sample's sub-fields in the source table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleColumns {
    pub sample_id: String,
    pub gt: usize,
    pub dp: usize,
    pub gq: usize,
    pub ab: usize,
}

impl SampleColumns {
    /// Locate `{sample}:GT`, `{sample}:DP`, `{sample}:GQ`, `{sample}:AB`
    ///
    /// Returns the name of the first absent sub-field on failure.
    pub fn resolve(table: &VariantTable, sample_id: &str) -> Result<Self, &'static str> {
        let mut found = [0usize; 4];
        for (slot, field) in found.iter_mut().zip(SAMPLE_FIELDS) {
            *slot = table
                .column_index(&format!("{}:{}", sample_id, field))
                .ok_or(field)?;
        }

        Ok(Self {
            sample_id: sample_id.to_string(),
            gt: found[0],
            dp: found[1],
            gq: found[2],
            ab: found[3],
        })
    }
}

/// Encode every row of one sample into its VCF column
///
/// # Arguments
/// * `table` - Immutable source table
/// * `columns` - Resolved sub-field positions for the sample
///
/// # Returns
/// * `Ok(Vec<String>)` - One encoded `GT:DP:GQ:AB` string per row, in row order
/// * `Err(GenotypeEncodingError)` - DP or GQ holds a non-numeric value
pub fn encode_sample_column(
    table: &VariantTable,
    columns: &SampleColumns,
) -> Result<Vec<String>, GenotypeEncodingError> {
    (0..table.num_rows())
        .map(|row| {
            let invalid = |field: &'static str, value: &str| GenotypeEncodingError::InvalidInteger {
                sample: columns.sample_id.clone(),
                row,
                field,
                value: value.to_string(),
            };

            let dp_raw = table.value(row, columns.dp);
            let gq_raw = table.value(row, columns.gq);
            let dp = coerce_integer(dp_raw).ok_or_else(|| invalid("DP", dp_raw))?;
            let gq = coerce_integer(gq_raw).ok_or_else(|| invalid("GQ", gq_raw))?;

            Ok(encode_sample(
                table.value(row, columns.gt),
                dp,
                gq,
                table.value(row, columns.ab),
            ))
        })
        .collect()
}

/// Join the four encoded sub-fields of one sample at one row
pub fn encode_sample(gt: &str, dp: i64, gq: i64, ab: &str) -> String {
    format!(
        "{}:{}:{}:{}",
        encode_genotype(gt),
        render_integer(dp),
        render_integer(gq),
        encode_allele_balance(ab)
    )
}

pub fn encode_genotype(value: &str) -> String {
    if is_missing(value) {
        MISSING_GENOTYPE.to_string()
    } else {
        clean_cell(value)
    }
}

/// Coerce a DP/GQ cell to an integer
///
/// Missing cells map to [`MISSING_SENTINEL`]. Floating point text is truncated
/// toward zero. Returns `None` when the cell is not numeric or does not fit
/// in an `i64`.
pub fn coerce_integer(value: &str) -> Option<i64> {
    if is_missing(value) {
        return Some(MISSING_SENTINEL);
    }

    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }

    // i64::MAX is not representable as f64; 2^63 is the first value past it
    const UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;
    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => {
            let truncated = parsed.trunc();
            if (i64::MIN as f64..UPPER_BOUND).contains(&truncated) {
                Some(truncated as i64)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Render an integer field; the sentinel becomes `.`
pub fn render_integer(value: i64) -> String {
    if value == MISSING_SENTINEL {
        MISSING_VALUE.to_string()
    } else {
        value.to_string()
    }
}

/// Allele balance: numeric zero and missing collapse to `.`
pub fn encode_allele_balance(value: &str) -> String {
    if is_missing(value) {
        return MISSING_VALUE.to_string();
    }

    let trimmed = value.trim();
    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed == 0.0 => MISSING_VALUE.to_string(),
        _ => clean_cell(trimmed),
    }
}
