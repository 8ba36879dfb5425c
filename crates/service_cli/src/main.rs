//! sabr-cube CLI - SABR swaption-cube calibration
//!
//! This is the operational entry point for the swaption-cube calibrator.
//!
//! # Commands
//!
//! - `sabr-cube calibrate` - Calibrate a SABR cube from the job's quote lattices
//! - `sabr-cube check` - Validate a job and its inputs
//! - `sabr-cube report --cube <file>` - Compare a calibrated cube with the job's quotes
//! - `sabr-cube price --cube <file> --side p --maturity 12 --tenor 60` - Price one swaption
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate wires the pricer crates to
//! job files on disk.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pricer_models::swaptions::SwaptionType;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

/// SABR swaption-cube calibrator
#[derive(Parser)]
#[command(name = "sabr-cube")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Job file path
    #[arg(short, long, global = true, default_value = "sabr-cube.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate the cube described by the job file
    Calibrate {
        /// Output file for the calibrated cube (overrides the job)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads (overrides the job and environment)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Print the fit to the job's quotes
        #[arg(short, long)]
        report: bool,
    },

    /// Check the job file and its inputs
    Check,

    /// Report the fit of a calibrated cube
    Report {
        /// Cube JSON written by `calibrate`
        #[arg(long)]
        cube: PathBuf,
    },

    /// Price one swaption from a calibrated cube
    Price {
        /// Cube JSON written by `calibrate`
        #[arg(long)]
        cube: PathBuf,

        /// payer (p) or receiver (r)
        #[arg(short, long, value_parser = commands::price::parse_side)]
        side: SwaptionType,

        /// Strike offset from par in basis points
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        moneyness: i32,

        /// Months to expiry
        #[arg(long)]
        maturity: i32,

        /// Swap length in months
        #[arg(long)]
        tenor: i32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; --verbose raises the default from info to debug
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Calibrate {
            output,
            threads,
            report,
        } => commands::calibrate::run(
            &cli.config,
            &commands::calibrate::CalibrateOptions {
                output,
                threads,
                report,
            },
        )?,
        Commands::Check => commands::check::run(&cli.config)?,
        Commands::Report { cube } => commands::report::run(&cli.config, &cube)?,
        Commands::Price {
            cube,
            side,
            moneyness,
            maturity,
            tenor,
        } => commands::price::run(
            &cli.config,
            &cube,
            commands::price::PriceRequest {
                side,
                moneyness,
                maturity,
                tenor,
            },
        )?,
    }
    Ok(())
}
