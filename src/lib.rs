// ==============================================================================
// lib.rs - CSV to VCF Converter Library
// ==============================================================================
// Description: Library interface for CSV to VCF conversion modules
// Author: Matt Barham
// Created: 2025-11-03
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================

pub mod parsers;
pub mod models;
pub mod genotype_encoder;
pub mod header;
pub mod transformer;
pub mod worker_pool;
pub mod processor;
pub mod output;
