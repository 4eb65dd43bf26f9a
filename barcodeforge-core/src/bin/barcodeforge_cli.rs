//! Barcode Forge CLI - Bridge interface for the request layer
//!
//! Commands: formats, validate, generate
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation or generation failure

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use barcodeforge_core::{
    respond, ArtifactStore, BarcodeFormat, BarcodePipeline, BarcodeRequest, DirectoryStore,
    InlineStore, Payload, PipelineConfig, Validator,
};

#[derive(Parser)]
#[command(name = "barcodeforge-cli")]
#[command(about = "Barcode Forge CLI - product data validation and barcode generation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a pipeline config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported barcode formats
    Formats,

    /// Validate product data
    Validate {
        /// Data format tag (json, csv)
        #[arg(short, long)]
        format: String,

        /// Payload: JSON for json, raw text for csv
        #[arg(short, long)]
        payload: String,
    },

    /// Generate a barcode image
    Generate {
        #[arg(long)]
        sku: Option<String>,
        #[arg(long)]
        upc: Option<String>,
        #[arg(long)]
        ean: Option<String>,

        /// EAN_13, UPC_A or CODE_128
        #[arg(short, long)]
        format: String,

        /// WIDTHxHEIGHT in pixels
        #[arg(long)]
        size: Option<String>,

        /// Hex foreground color
        #[arg(long)]
        color: Option<String>,

        /// DPI
        #[arg(long, allow_negative_numbers = true)]
        resolution: Option<i64>,

        /// Write images and records here; without it the image is returned inline
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Public prefix for image URLs written to out_dir
        #[arg(long, requires = "out_dir")]
        base_url: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => println!(r#"{{"error": "Failed to serialize output: {}"}}"#, e),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match PipelineConfig::load_from_file(path) {
            Ok(c) => c,
            Err(e) => {
                print_json(&serde_json::json!({ "error": e.to_string() }));
                return ExitCode::FAILURE;
            }
        },
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Formats => {
            let formats: Vec<_> = BarcodeFormat::ALL
                .iter()
                .map(|f| serde_json::json!({ "format": f, "alias": f.alias() }))
                .collect();
            print_json(&serde_json::Value::Array(formats));
            ExitCode::SUCCESS
        }

        Commands::Validate { format, payload } => {
            let payload = if format.eq_ignore_ascii_case("csv") {
                Payload::RawText(payload)
            } else {
                match serde_json::from_str::<serde_json::Value>(&payload) {
                    Ok(value) => Payload::from_json(value),
                    Err(e) => {
                        tracing::warn!(error = %e, "payload is not JSON");
                        Payload::RawText(payload)
                    }
                }
            };

            let result = Validator::new().validate(&format, &payload);
            print_json(&serde_json::json!(result));
            if result.is_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Generate {
            sku,
            upc,
            ean,
            format,
            size,
            color,
            resolution,
            out_dir,
            base_url,
        } => {
            let request = BarcodeRequest { sku, upc, ean, format, size, color, resolution };
            let pipeline = BarcodePipeline::new(config);

            let store: Box<dyn ArtifactStore> = match out_dir {
                Some(dir) => match DirectoryStore::new(dir) {
                    Ok(store) => match base_url {
                        Some(base) => Box::new(store.with_base_url(base)),
                        None => Box::new(store),
                    },
                    Err(e) => {
                        print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
                        return ExitCode::FAILURE;
                    }
                },
                None => Box::new(InlineStore),
            };

            match respond(&pipeline, store.as_ref(), &request) {
                Ok(response) => {
                    print_json(&serde_json::json!({ "success": true, "barcode": response }));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!(error = %e, "barcode generation failed");
                    print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
                    ExitCode::from(2)
                }
            }
        }
    }
}
