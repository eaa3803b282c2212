// ==============================================================================
// parsers/mod.rs - Input table parsers
// ==============================================================================
// Description: Parsers for the variant table and the column metadata table
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================

pub mod metadata;
pub mod variant_table;

pub use metadata::{ColumnMetadata, MetadataError, MetadataParser};
pub use variant_table::{VariantTable, VariantTableError};
