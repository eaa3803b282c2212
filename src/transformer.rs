// ==============================================================================
// transformer.rs - Variant Table to VCF Row Transformation
// ==============================================================================
// Description: Builds VCF data rows (INFO, FORMAT, sample columns) from the
//              variant table and the declared column metadata
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-18
// Version: 3.0.0
// ==============================================================================
// Pipeline:
//   1. Resolve fixed columns (CHROM, POS, REF, ALT, FILTER)
//   2. Restrict declared INFO fields to columns present in the table
//   3. Derive sample IDs from `{sample}:{field}` column names
//   4. Encode INFO strings in row batches and sample columns per sample,
//      both on the worker pool
//   5. Join: assemble rows once every batch and sample has finished
// ==============================================================================

use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::genotype_encoder::{
    encode_sample_column, GenotypeEncodingError, SampleColumns, SAMPLE_FIELDS,
};
use crate::models::{clean_cell, normalize_value, ColumnSpec, VcfRow, MISSING_VALUE};
use crate::parsers::{ColumnMetadata, VariantTable};
use crate::worker_pool::{WorkerFailure, WorkerPool};

/// Columns every variant table must carry
pub const REQUIRED_COLUMNS: [&str; 5] = ["CHROM", "POS", "REF", "ALT", "FILTER"];

/// Errors that can occur while transforming the variant table
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Schema mismatch: required column '{0}' is missing from the variant table")]
    SchemaMismatch(&'static str),

    #[error("Sample field missing: sample '{sample}' has no '{sample}:{field}' column")]
    SampleFieldMissing { sample: String, field: &'static str },

    #[error("Invalid sample value: {0}")]
    InvalidSampleValue(#[from] GenotypeEncodingError),

    #[error("Encoding worker error: {0}")]
    EncodingWorker(#[from] WorkerFailure),
}

/// Transformed rows plus the sample order used for their columns
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub samples: Vec<String>,
    pub rows: Vec<VcfRow>,
}

#[derive(Debug, Clone, Copy)]
struct FixedColumns {
    chrom: usize,
    pos: usize,
    ref_allele: usize,
    alt_allele: usize,
    filter: usize,
}

impl FixedColumns {
    fn resolve(table: &VariantTable) -> Result<Self, TransformError> {
        let mut found = [0usize; 5];
        for (slot, name) in found.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = table
                .column_index(name)
                .ok_or(TransformError::SchemaMismatch(name))?;
        }

        Ok(Self {
            chrom: found[0],
            pos: found[1],
            ref_allele: found[2],
            alt_allele: found[3],
            filter: found[4],
        })
    }
}

/// Converts a loaded variant table into VCF rows
pub struct RecordTransformer {
    pool: WorkerPool,
}

impl RecordTransformer {
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    /// Transform every table row into a VCF row
    ///
    /// # Arguments
    /// * `table` - Immutable source table, shared with the worker pool
    /// * `metadata` - Declared INFO/FORMAT columns
    ///
    /// # Returns
    /// * `Ok(TransformOutput)` - One row per input row, in input order
    /// * `Err(TransformError)` - Missing fixed column, incomplete sample or
    ///   failed encoding; no partial output is produced
    pub async fn transform(
        &self,
        table: Arc<VariantTable>,
        metadata: &ColumnMetadata,
    ) -> Result<TransformOutput, TransformError> {
        let fixed = FixedColumns::resolve(&table)?;

        let info_columns = Arc::new(present_info_columns(&table, metadata.info_columns()));
        let format = format_string(&metadata.format_ids());

        let sample_ids = extract_sample_ids(table.headers());
        let sample_columns = sample_ids
            .iter()
            .map(|sample| {
                SampleColumns::resolve(&table, sample).map_err(|field| {
                    TransformError::SampleFieldMissing {
                        sample: sample.clone(),
                        field,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Transforming {} rows: {} INFO fields, {} samples",
            table.num_rows(),
            info_columns.len(),
            sample_ids.len()
        );

        // INFO strings, batched by row
        let batches = row_batches(table.num_rows(), self.pool.workers());
        let info_strings: Vec<String> = {
            let table = Arc::clone(&table);
            let info_columns = Arc::clone(&info_columns);
            self.pool
                .scatter_gather("info", batches, move |rows: Range<usize>| {
                    Ok::<_, TransformError>(
                        rows.map(|row| info_string(&table, row, &info_columns))
                            .collect::<Vec<_>>(),
                    )
                })
                .await?
                .into_iter()
                .flatten()
                .collect()
        };

        // Sample columns, one work item per sample
        let encoded_samples: Vec<Vec<String>> = {
            let table = Arc::clone(&table);
            self.pool
                .scatter_gather("genotype", sample_columns, move |columns: SampleColumns| {
                    encode_sample_column(&table, &columns).map_err(TransformError::from)
                })
                .await?
        };

        debug!("All encoding work complete, assembling rows");

        let mut sample_rows = transpose_samples(encoded_samples, info_strings.len())?;
        let rows = info_strings
            .into_iter()
            .enumerate()
            .map(|(row, info)| VcfRow {
                chrom: normalize_chrom(table.value(row, fixed.chrom)),
                pos: clean_cell(table.value(row, fixed.pos)),
                ref_allele: normalize_value(table.value(row, fixed.ref_allele)),
                alt_allele: normalize_value(table.value(row, fixed.alt_allele)),
                filter: normalize_value(table.value(row, fixed.filter)),
                info,
                format: format.clone(),
                samples: std::mem::take(&mut sample_rows[row]),
            })
            .collect();

        Ok(TransformOutput {
            samples: sample_ids,
            rows,
        })
    }
}

/// Declared INFO fields that exist in the table, with their column positions
///
/// Lookup uses the declared name; the returned key is the sanitized ID written
/// to the INFO column. Declared order is kept; absent fields are skipped.
pub fn present_info_columns<'a>(
    table: &VariantTable,
    declared: impl IntoIterator<Item = &'a ColumnSpec>,
) -> Vec<(String, usize)> {
    declared
        .into_iter()
        .filter_map(|spec| match table.column_index(&spec.source_id) {
            Some(column) => Some((spec.id.clone(), column)),
            None => {
                debug!("INFO field '{}' not present in variant table, skipping", spec.source_id);
                None
            }
        })
        .collect()
}

/// Turn per-sample columns into per-row sample lists
///
/// Every column must hold exactly `rows` entries.
fn transpose_samples(
    columns: Vec<Vec<String>>,
    rows: usize,
) -> Result<Vec<Vec<String>>, TransformError> {
    let mut by_row: Vec<Vec<String>> = (0..rows).map(|_| Vec::with_capacity(columns.len())).collect();
    for (index, column) in columns.into_iter().enumerate() {
        if column.len() != rows {
            return Err(WorkerFailure {
                index: Some(index),
                details: format!("sample column has {} values, expected {}", column.len(), rows),
            }
            .into());
        }
        for (slot, value) in by_row.iter_mut().zip(column) {
            slot.push(value);
        }
    }
    Ok(by_row)
}

/// Constant FORMAT column value for the whole file
pub fn format_string(format_ids: &[String]) -> String {
    let format = format_ids.join(":");
    if format_ids.iter().map(String::as_str).ne(SAMPLE_FIELDS) {
        warn!(
            "Declared FORMAT '{}' differs from the encoded sample layout '{}'",
            format,
            SAMPLE_FIELDS.join(":")
        );
    }
    format
}

/// Distinct sample IDs (text before the first ':'), in first-appearance order
pub fn extract_sample_ids(headers: &[String]) -> Vec<String> {
    let mut samples: Vec<String> = Vec::new();
    for header in headers {
        if let Some((sample, _)) = header.split_once(':') {
            if !samples.iter().any(|s| s == sample) {
                samples.push(sample.to_string());
            }
        }
    }
    samples
}

/// `key=value;key=value` for one row; `.` when no INFO field is present
pub fn info_string(table: &VariantTable, row: usize, info_columns: &[(String, usize)]) -> String {
    if info_columns.is_empty() {
        return MISSING_VALUE.to_string();
    }

    info_columns
        .iter()
        .map(|(id, column)| format!("{}={}", id, normalize_value(table.value(row, *column))))
        .collect::<Vec<_>>()
        .join(";")
}

/// Strip a leading `chr` (`chr1` → `1`)
pub fn normalize_chrom(value: &str) -> String {
    let cleaned = clean_cell(value);
    match cleaned.strip_prefix("chr") {
        Some(rest) => rest.to_string(),
        None => cleaned,
    }
}

/// Split `0..total` into at most `workers` contiguous ranges
fn row_batches(total: usize, workers: usize) -> Vec<Range<usize>> {
    if total == 0 {
        return Vec::new();
    }
    let size = total.div_ceil(workers.max(1));
    (0..total)
        .step_by(size)
        .map(|start| start..(start + size).min(total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::MetadataParser;

    const METADATA: &str = "\
ID,type,Number,Dtype,Description
DP_total,INFO,1,Integer,Total depth
MISSING_INFO,INFO,1,String,Declared but absent
GT,FORMAT,1,String,Genotype
DP,FORMAT,1,Integer,Read depth
GQ,FORMAT,1,Integer,Genotype quality
AB,FORMAT,1,Float,Allele balance
";

    fn table(contents: &str) -> Arc<VariantTable> {
        Arc::new(VariantTable::from_reader(contents.as_bytes()).unwrap())
    }

    fn metadata() -> ColumnMetadata {
        MetadataParser::from_reader(METADATA.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_single_row_scenario() {
        let table = table(
            "\
CHROM,POS,REF,ALT,FILTER,DP_total,S1:GT,S1:DP,S1:GQ,S1:AB
chr1,100,A,T,,30,0/1,,40,0
",
        );
        let transformer = RecordTransformer::new(WorkerPool::new(4));
        let output = transformer.transform(table, &metadata()).await.unwrap();

        assert_eq!(output.samples, vec!["S1"]);
        assert_eq!(output.rows.len(), 1);
        assert_eq!(
            output.rows[0].to_line(),
            "1\t100\t.\tA\tT\t0\t.\tDP_total=30\tGT:DP:GQ:AB\t0/1:.:40:."
        );
    }

    #[tokio::test]
    async fn test_multi_sample_rows_keep_order_and_width() {
        let mut contents =
            String::from("CHROM,POS,REF,ALT,FILTER,DP_total,B:GT,B:DP,B:GQ,B:AB,A:GT,A:DP,A:GQ,A:AB\n");
        for i in 0..50 {
            contents.push_str(&format!(
                "chr{},{},G,C,PASS,{},1/1,{},99,0.5,,,,\n",
                i % 22 + 1,
                1000 + i,
                i,
                i
            ));
        }

        let transformer = RecordTransformer::new(WorkerPool::new(3));
        let output = transformer.transform(table(&contents), &metadata()).await.unwrap();

        // First-appearance sample order
        assert_eq!(output.samples, vec!["B", "A"]);
        assert_eq!(output.rows.len(), 50);

        for (i, row) in output.rows.iter().enumerate() {
            let line = row.to_line();
            assert_eq!(line.split('\t').count(), 9 + 2);
            assert_eq!(row.pos, (1000 + i).to_string());
            assert_eq!(row.info, format!("DP_total={}", i));
            assert!(!row.info.contains("MISSING_INFO"));
            assert_eq!(row.samples[1], "./.:.:.:.");
        }
        assert_eq!(output.rows[7].samples[0], "1/1:7:99:0.5");
    }

    #[tokio::test]
    async fn test_transform_is_deterministic() {
        let contents = "\
CHROM,POS,REF,ALT,FILTER,S2:GT,S2:DP,S2:GQ,S2:AB,S1:GT,S1:DP,S1:GQ,S1:AB
chr2,5,A,G,PASS,0/0,3,20,0,0/1,4,30,0.25
chr3,6,C,T,,1/1,,,0.9,,8,,0
";
        let transformer = RecordTransformer::new(WorkerPool::new(2));
        let first = transformer.transform(table(contents), &metadata()).await.unwrap();
        let second = transformer.transform(table(contents), &metadata()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_fixed_column() {
        let contents = "CHROM,POS,REF,ALT,S1:GT\nchr1,1,A,T,0/1\n";
        let transformer = RecordTransformer::new(WorkerPool::new(1));
        let error = transformer.transform(table(contents), &metadata()).await.unwrap_err();
        assert!(matches!(error, TransformError::SchemaMismatch("FILTER")));
    }

    #[tokio::test]
    async fn test_sample_missing_sub_field() {
        let contents = "\
CHROM,POS,REF,ALT,FILTER,S1:GT,S1:DP,S1:GQ,S1:AB,S2:GT,S2:DP,S2:AB
chr1,1,A,T,PASS,0/1,1,2,0.1,0/0,3,0
";
        let transformer = RecordTransformer::new(WorkerPool::new(2));
        match transformer.transform(table(contents), &metadata()).await.unwrap_err() {
            TransformError::SampleFieldMissing { sample, field } => {
                assert_eq!(sample, "S2");
                assert_eq!(field, "GQ");
            }
            other => panic!("Expected SampleFieldMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_depth_aborts_whole_batch() {
        let contents = "\
CHROM,POS,REF,ALT,FILTER,S1:GT,S1:DP,S1:GQ,S1:AB,S2:GT,S2:DP,S2:GQ,S2:AB
chr1,1,A,T,PASS,0/1,1,2,0.1,0/0,high,5,0
";
        let transformer = RecordTransformer::new(WorkerPool::new(2));
        let error = transformer.transform(table(contents), &metadata()).await.unwrap_err();
        assert!(matches!(error, TransformError::InvalidSampleValue(_)));
    }

    #[tokio::test]
    async fn test_no_info_columns_present() {
        let contents = "CHROM,POS,REF,ALT,FILTER\nchrX,9,A,T,low qual\n";
        let transformer = RecordTransformer::new(WorkerPool::new(2));
        let output = transformer.transform(table(contents), &metadata()).await.unwrap();

        assert!(output.samples.is_empty());
        assert_eq!(output.rows[0].to_line(), "X\t9\t.\tA\tT\t0\tlow.qual\t.\tGT:DP:GQ:AB");
    }

    #[tokio::test]
    async fn test_empty_table() {
        let contents = "CHROM,POS,REF,ALT,FILTER,S1:GT,S1:DP,S1:GQ,S1:AB\n";
        let transformer = RecordTransformer::new(WorkerPool::new(4));
        let output = transformer.transform(table(contents), &metadata()).await.unwrap();
        assert_eq!(output.samples, vec!["S1"]);
        assert!(output.rows.is_empty());
    }

    #[test]
    fn test_info_string_blank_values() {
        let table = table("DP_total,AF\n ,\n");
        let metadata = MetadataParser::from_reader(
            "ID,type,Number,Dtype,Description\nAF,INFO,1,Float,af\nDP_total,INFO,1,Integer,dp\n"
                .as_bytes(),
        )
        .unwrap();
        let columns = present_info_columns(&table, metadata.info_columns());
        assert_eq!(info_string(&table, 0, &columns), "AF=.;DP_total=.");
    }

    #[tokio::test]
    async fn test_spaced_info_id_is_found_and_sanitized() {
        let metadata = MetadataParser::from_reader(
            "ID,type,Number,Dtype,Description\nAllele Freq,INFO,1,Float,Allele frequency\n"
                .as_bytes(),
        )
        .unwrap();
        let contents = "CHROM,POS,REF,ALT,FILTER,Allele Freq\nchr1,100,A,T,PASS,0.3\n";
        let transformer = RecordTransformer::new(WorkerPool::new(2));
        let output = transformer.transform(table(contents), &metadata).await.unwrap();
        assert_eq!(output.rows[0].info, "Allele.Freq=0.3");
    }

    #[tokio::test]
    async fn test_embedded_tab_and_newline_keep_line_shape() {
        let metadata = MetadataParser::from_reader(
            "ID,type,Number,Dtype,Description\nNOTE,INFO,1,String,Free text\n".as_bytes(),
        )
        .unwrap();
        let contents = "\
CHROM,POS,REF,ALT,FILTER,NOTE,S1:GT,S1:DP,S1:GQ,S1:AB
\"chr1\tx\",\"100\n\",A,T,\"low\tqual\",\"a\tb\nc\",\"0/1\r\n1\",3,40,\"0.5\t\"
";
        let transformer = RecordTransformer::new(WorkerPool::new(2));
        let output = transformer.transform(table(contents), &metadata).await.unwrap();

        let line = output.rows[0].to_line();
        assert_eq!(line.split('\t').count(), 10);
        assert!(!line.contains('\n') && !line.contains('\r'));
        assert_eq!(output.rows[0].chrom, "1.x");
        assert_eq!(output.rows[0].pos, "100");
        assert_eq!(output.rows[0].filter, "low.qual");
        assert_eq!(output.rows[0].info, "NOTE=a.b.c");
        assert_eq!(output.rows[0].samples[0], "0/1..1:3:40:0.5");
    }

    #[test]
    fn test_short_sample_column_is_rejected() {
        let columns = vec![
            vec!["0/1:.:.:.".to_string(), "1/1:.:.:.".to_string()],
            vec!["0/0:.:.:.".to_string()],
        ];
        match transpose_samples(columns, 2).unwrap_err() {
            TransformError::EncodingWorker(failure) => assert_eq!(failure.index, Some(1)),
            other => panic!("Expected EncodingWorker error, got {:?}", other),
        }
    }

    #[test]
    fn test_transpose_samples() {
        let columns = vec![
            vec!["a0".to_string(), "a1".to_string()],
            vec!["b0".to_string(), "b1".to_string()],
        ];
        assert_eq!(
            transpose_samples(columns, 2).unwrap(),
            vec![vec!["a0", "b0"], vec!["a1", "b1"]]
        );
    }

    #[test]
    fn test_extract_sample_ids() {
        let headers: Vec<String> = ["CHROM", "S1:GT", "S1:DP", "S10:GT", "POS", "S2:AB:x"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(extract_sample_ids(&headers), vec!["S1", "S10", "S2"]);
    }

    #[test]
    fn test_normalize_chrom() {
        assert_eq!(normalize_chrom("chr1"), "1");
        assert_eq!(normalize_chrom("chrX"), "X");
        assert_eq!(normalize_chrom("22"), "22");
        assert_eq!(normalize_chrom("MT"), "MT");
        assert_eq!(normalize_chrom(" chr2\n"), "2");
    }

    #[test]
    fn test_row_batches_cover_all_rows() {
        assert!(row_batches(0, 4).is_empty());
        assert_eq!(row_batches(10, 4), vec![0..3, 3..6, 6..9, 9..10]);
        assert_eq!(row_batches(3, 8), vec![0..1, 1..2, 2..3]);
        assert_eq!(row_batches(5, 1), vec![0..5]);
    }

    #[test]
    fn test_format_string() {
        let ids: Vec<String> = SAMPLE_FIELDS.iter().map(|s| s.to_string()).collect();
        assert_eq!(format_string(&ids), "GT:DP:GQ:AB");
    }
}
