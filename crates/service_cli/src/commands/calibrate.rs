//! Calibrate command implementation
//!
//! Calibrates a SABR cube from the lattices of a job using the
//! pricer_optimiser crate and writes it as JSON.

use std::path::{Path, PathBuf};

use pricer_core::market_data::QuoteTable;
use pricer_optimiser::calibration::SabrCubeCalibrator;
use tracing::info;

use super::report::FitReport;
use super::{read_json, JobInputs};
use crate::config::CalibrationJob;
use crate::{CliError, Result};

/// Command line overrides of the job file.
#[derive(Debug, Clone, Default)]
pub struct CalibrateOptions {
    /// Replaces the job's output file
    pub output: Option<PathBuf>,
    /// Replaces the job's worker count
    pub threads: Option<usize>,
    /// Print the fit report after calibrating
    pub report: bool,
}

/// Run the calibrate command
pub fn run(job_path: &Path, options: &CalibrateOptions) -> Result<()> {
    let mut job = CalibrationJob::load_with_env_and_validate(job_path)?;
    if let Some(threads) = options.threads {
        if threads == 0 {
            return Err(CliError::InvalidArgument(
                "--threads must be at least 1".to_string(),
            ));
        }
        job.calibration.threads = threads;
    }

    info!("Starting calibration...");
    info!("  Job: {}", job_path.display());
    info!("  Cube: {}", job.name);
    info!("  Reference date: {}", job.reference_date);
    info!("  Tenors: {:?}", job.tenors);
    info!("  Mapping: {}", job.mapping);
    info!("  Threads: {}", job.calibration.threads);

    let inputs = JobInputs::load(&job)?;
    let mut calibrator = SabrCubeCalibrator::new(
        job.reference_date,
        inputs.cash_payer.clone(),
        inputs.cash_receiver.clone(),
        inputs.physical.clone(),
        inputs.market.clone(),
        job.mapping,
        job.structure,
    )
    .with_config(job.calibration.clone());

    if let Some(initial) = &job.initial {
        let rho: QuoteTable = read_json(&job.resolve(&initial.rho))?;
        let base_vol: QuoteTable = read_json(&job.resolve(&initial.base_vol))?;
        let vol_vol: QuoteTable = read_json(&job.resolve(&initial.vol_vol))?;
        calibrator = calibrator.set_initial_parameters(rho, base_vol, vol_vol)?;
    }

    let cube = calibrator.calibrate(&job.name, &job.tenors)?;

    if options.report {
        let report = FitReport::build(&cube, &inputs, job.mapping, job.calibration.replication)?;
        info!(
            vol_rms_bp = report.rms_bp(),
            price_rms_bp = report.price_rms_bp(),
            "quote fit"
        );
        print!("{}", report.render());
    }

    let output = options
        .output
        .clone()
        .or_else(|| job.output.as_ref().map(|p| job.resolve(p)));
    let json = serde_json::to_string_pretty(&cube).map_err(|source| CliError::Json {
        path: output.clone().unwrap_or_else(|| PathBuf::from("<stdout>")),
        source,
    })?;

    match output {
        Some(path) => {
            info!("Writing calibrated cube to: {}", path.display());
            std::fs::write(&path, json).map_err(|source| CliError::Io { path, source })?;
        }
        None => println!("{}", json),
    }

    info!("Calibration complete");
    Ok(())
}
