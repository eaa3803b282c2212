// ==============================================================================
// output.rs - VCF Output Generation
// ==============================================================================
// Description: Writes the header block and data rows as plain or gzip VCF
// Author: Matt Barham
// Created: 2025-11-06
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================
// Output is staged in a temporary file next to the destination and only
// renamed into place once every line has been written, so a failed run never
// leaves a truncated VCF behind.
// ==============================================================================

use anyhow::{Context, Result};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::header::{column_header_line, HeaderBlock};
use crate::models::VcfRow;

/// Plain text or gzip-compressed VCF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcfCompression {
    Plain,
    Gzip,
}

impl VcfCompression {
    /// `.gz` destinations are compressed
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => VcfCompression::Gzip,
            _ => VcfCompression::Plain,
        }
    }
}

/// VCF file writer
#[derive(Debug, Clone)]
pub struct VcfWriter {
    /// Emit the `#CHROM ...` column line after the header block
    column_header: bool,
}

impl VcfWriter {
    pub fn new(column_header: bool) -> Self {
        Self { column_header }
    }

    /// Write a complete VCF to `path`
    ///
    /// # Arguments
    /// * `path` - Destination; a `.gz` suffix selects gzip compression
    /// * `header` - Meta lines written first
    /// * `samples` - Sample order, used for the optional column line
    /// * `rows` - Data rows in output order
    ///
    /// # Returns
    /// * Path of the written file
    pub fn write(
        &self,
        path: &Path,
        header: &HeaderBlock,
        samples: &[String],
        rows: &[VcfRow],
    ) -> Result<PathBuf> {
        let compression = VcfCompression::from_path(path);
        info!("Writing {:?} VCF output: {:?}", compression, path);

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;

        let staging = NamedTempFile::new_in(dir).context("Failed to create staging file")?;
        let column_line = self.column_header.then(|| column_header_line(samples));

        let staging = match compression {
            VcfCompression::Plain => {
                let mut writer = BufWriter::new(staging);
                write_lines(&mut writer, header, column_line.as_deref(), rows)?;
                writer
                    .into_inner()
                    .map_err(|e| e.into_error())
                    .context("Failed to flush VCF output")?
            }
            VcfCompression::Gzip => {
                let mut encoder = flate2::write::GzEncoder::new(
                    BufWriter::new(staging),
                    flate2::Compression::default(),
                );
                write_lines(&mut encoder, header, column_line.as_deref(), rows)?;
                encoder
                    .finish()
                    .context("Failed to finish gzip stream")?
                    .into_inner()
                    .map_err(|e| e.into_error())
                    .context("Failed to flush VCF output")?
            }
        };

        staging
            .persist(path)
            .with_context(|| format!("Failed to move VCF output into place at {:?}", path))?;

        info!(
            "VCF output complete: {} header lines, {} variants",
            header.lines().len(),
            rows.len()
        );

        Ok(path.to_path_buf())
    }
}

fn write_lines<W: Write>(
    writer: &mut W,
    header: &HeaderBlock,
    column_line: Option<&str>,
    rows: &[VcfRow],
) -> Result<()> {
    for line in header.lines() {
        writeln!(writer, "{}", line)?;
    }
    if let Some(line) = column_line {
        writeln!(writer, "{}", line)?;
    }
    for row in rows {
        writeln!(writer, "{}", row.to_line())?;
    }
    Ok(())
}
