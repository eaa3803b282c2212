// ==============================================================================
// main.rs - CSV to VCF Converter Entry Point
// ==============================================================================
// Description: Command line entry point for converting variant CSVs to VCF
// Author: Matt Barham
// Created: 2025-10-31
// Modified: 2026-10-18
// Version: 2.0.0
// ==============================================================================

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use csv_to_vcf::header::DEFAULT_REFERENCE;
use csv_to_vcf::processor::{ConversionConfig, VcfProcessor};

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert a variant CSV into VCF", long_about = None)]
struct Args {
    /// Source variant table (CSV)
    csv_file: PathBuf,

    /// Column metadata table (CSV: ID, type, Number, Dtype, Description)
    col_info_file: PathBuf,

    /// Output file name (append .gz for compressed output)
    output_name: PathBuf,

    /// Directory the output file is written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Number of encoding workers
    #[arg(short, long, env = "CSV_TO_VCF_WORKERS", default_value_t = 8,
          value_parser = clap::value_parser!(u16).range(1..))]
    workers: u16,

    /// Reference genome named in the header
    #[arg(long, env = "CSV_TO_VCF_REFERENCE", default_value = DEFAULT_REFERENCE)]
    reference: String,

    /// Also write the #CHROM column header line
    #[arg(long)]
    column_header: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "csv_to_vcf=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let output = if args.output_name.is_absolute() {
        args.output_name.clone()
    } else {
        args.output_dir.join(&args.output_name)
    };

    let mut config = ConversionConfig::new(args.csv_file, args.col_info_file, output);
    config.workers = usize::from(args.workers);
    config.reference = args.reference;
    config.column_header = args.column_header;

    info!("CSV to VCF converter starting ({} workers)", config.workers);

    match VcfProcessor::new(config).process().await {
        Ok(summary) => {
            info!("Conversion completed successfully: {:?}", summary.output_path);
            Ok(())
        }
        Err(e) => {
            error!("Conversion failed: {:#}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_positional_arguments_and_defaults() {
        let args = Args::try_parse_from(["csv-to-vcf", "in.csv", "cols.csv", "out.vcf"]).unwrap();
        assert_eq!(args.csv_file, PathBuf::from("in.csv"));
        assert_eq!(args.col_info_file, PathBuf::from("cols.csv"));
        assert_eq!(args.output_name, PathBuf::from("out.vcf"));
        assert!(!args.column_header);

        // Read declared defaults so CSV_TO_VCF_* variables in the test
        // environment cannot change the outcome
        let command = Args::command();
        let default_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id().as_str() == id)
                .unwrap()
                .get_default_values()
                .iter()
                .map(|value| value.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
        };
        assert_eq!(default_of("reference"), vec!["hg38"]);
        assert_eq!(default_of("workers"), vec!["8"]);
        assert_eq!(default_of("output_dir"), vec!["."]);
    }

    #[test]
    fn test_explicit_reference_flag() {
        let args = Args::try_parse_from([
            "csv-to-vcf", "in.csv", "cols.csv", "out.vcf", "--reference", "GRCh37",
        ])
        .unwrap();
        assert_eq!(args.reference, "GRCh37");
    }

    #[test]
    fn test_missing_positional_is_rejected() {
        assert!(Args::try_parse_from(["csv-to-vcf", "in.csv", "cols.csv"]).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(
            Args::try_parse_from(["csv-to-vcf", "a.csv", "b.csv", "c.vcf", "--workers", "0"])
                .is_err()
        );
    }
}
