// ==============================================================================
// processor.rs - CSV to VCF Conversion Pipeline
// ==============================================================================
// Description: Loads metadata and variant tables, transforms rows, writes VCF
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-18
// Version: 3.0.0
// ==============================================================================

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::header::{HeaderBlock, DEFAULT_REFERENCE};
use crate::output::VcfWriter;
use crate::parsers::{MetadataParser, VariantTable};
use crate::transformer::RecordTransformer;
use crate::worker_pool::{WorkerPool, DEFAULT_WORKERS};

/// Everything one conversion run needs
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Source variant table (CSV)
    pub input: PathBuf,
    /// Column metadata table (CSV)
    pub metadata: PathBuf,
    /// Destination VCF (`.gz` for compressed output)
    pub output: PathBuf,
    pub workers: usize,
    /// Value of the `##reference=` line
    pub reference: String,
    /// Emit the `#CHROM ...` column line
    pub column_header: bool,
}

impl ConversionConfig {
    pub fn new(input: PathBuf, metadata: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            metadata,
            output,
            workers: DEFAULT_WORKERS,
            reference: DEFAULT_REFERENCE.to_string(),
            column_header: false,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub output_path: PathBuf,
    pub variants: usize,
    pub samples: usize,
    pub header_lines: usize,
}

pub struct VcfProcessor {
    config: ConversionConfig,
}

impl VcfProcessor {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    /// Main processing pipeline
    ///
    /// Any failure aborts the run before the output file is created.
    pub async fn process(&self) -> Result<ConversionSummary> {
        info!("Starting CSV to VCF conversion: {:?}", self.config.input);

        // 1. Metadata (header declarations, INFO and FORMAT field lists)
        info!("Prepare info: loading column metadata from {:?}", self.config.metadata);
        let metadata = MetadataParser::parse(&self.config.metadata).with_context(|| {
            format!("Failed to load column metadata {:?}", self.config.metadata)
        })?;

        let header = HeaderBlock::today(
            &self.config.input.display().to_string(),
            &self.config.reference,
            &metadata,
        );

        // 2. Source table, loaded once and shared read-only
        info!("Prepare data: loading variant table {:?}", self.config.input);
        let table = tokio::task::spawn_blocking({
            let path = self.config.input.clone();
            move || -> Result<VariantTable> {
                VariantTable::from_path(&path)
                    .with_context(|| format!("Failed to load variant table {:?}", path))
            }
        })
        .await??;
        let table = Arc::new(table);

        // 3. Transform on the worker pool
        let transformer = RecordTransformer::new(WorkerPool::new(self.config.workers));
        let output = transformer
            .transform(Arc::clone(&table), &metadata)
            .await
            .context("Failed to transform variant table")?;

        // 4. Write
        info!("Saving");
        let summary = ConversionSummary {
            output_path: self.config.output.clone(),
            variants: output.rows.len(),
            samples: output.samples.len(),
            header_lines: header.lines().len(),
        };

        let writer = VcfWriter::new(self.config.column_header);
        let path = self.config.output.clone();
        tokio::task::spawn_blocking(move || {
            writer.write(&path, &header, &output.samples, &output.rows)
        })
        .await??;

        info!(
            "Saved as {:?} ({} variants, {} samples)",
            summary.output_path, summary.variants, summary.samples
        );

        Ok(summary)
    }
}
