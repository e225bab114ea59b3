//! Calibration Builder CLI
//!
//! Fits spread/total calibration from historical games and inspects bundles.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use gridiron_core::calibration::CalibrationMethod;
#[cfg(feature = "cli")]
use gridiron_core::config::SimConfig;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "calibration_builder")]
#[command(about = "Fit probability calibration from historical games", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Fit a calibration bundle from a history CSV
    Fit {
        /// Input CSV file path
        #[arg(long)]
        csv: PathBuf,

        /// Output bundle JSON file path
        #[arg(long)]
        out: PathBuf,

        /// Fit method (isotonic or platt), overrides the config
        #[arg(long)]
        method: Option<CalibrationMethod>,

        /// Engine config (JSON or YAML); defaults to GRIDIRON_CONFIG_PATH or built-in defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Verify and summarize a calibration bundle
    Inspect {
        /// Bundle JSON file path
        #[arg(long)]
        model: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fit {
            csv,
            out,
            method,
            config,
        } => {
            let mut sim_config = match config {
                Some(path) => SimConfig::load(&path)?,
                None => SimConfig::from_env_or_default()?,
            };
            if let Some(method) = method {
                sim_config.calibration.method = method;
            }

            println!("Fitting calibration...");
            println!("   CSV Input: {}", csv.display());
            println!("   Output:    {}", out.display());
            println!("   Method:    {:?}", sim_config.calibration.method);

            let bundle = calibration_builder::build_calibration(&csv, &out, &sim_config)?;
            print_bundle(&bundle);
        }

        Commands::Inspect { model } => {
            let bundle = calibration_builder::load_bundle(&model)?;
            println!("Checksum verified: {}", model.display());
            print_bundle(&bundle);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_bundle(bundle: &calibration_builder::CalibrationBundle) {
    println!("\nCalibration bundle {}", bundle.schema_version);
    println!("   Config:   {} ({})", bundle.config_version, &bundle.config_fingerprint[..12.min(bundle.config_fingerprint.len())]);
    println!(
        "   Rows:     {} ({} rejected, {} spread pushes, {} total pushes)",
        bundle.stats.rows, bundle.stats.rejected_rows, bundle.stats.spread_pushes, bundle.stats.total_pushes
    );
    for (name, diag) in [("spread", &bundle.diagnostics.spread), ("total", &bundle.diagnostics.total)] {
        match &diag.fallback_reason {
            Some(reason) => println!("   {name:<7} sigmoid fallback ({} samples): {reason}", diag.samples),
            None => println!(
                "   {name:<7} {} samples, brier {:.4}, log loss {:.4}, accuracy {:.1}%",
                diag.samples,
                diag.metrics.brier,
                diag.metrics.log_loss,
                diag.metrics.accuracy * 100.0
            ),
        }
        for bin in &diag.reliability {
            println!(
                "      [{:.1}, {:.1})  n={:<5} predicted {:.3}  actual {:.3}",
                bin.bucket_start, bin.bucket_end, bin.count, bin.avg_pred, bin.actual_rate
            );
        }
    }
    println!("   Checksum: {}", bundle.checksum);
    println!("   Created:  {}", bundle.created_at);
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("calibration_builder CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
