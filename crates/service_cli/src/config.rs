//! Calibration job configuration.
//!
//! A job is a TOML file naming the valuation date, the curves, the three
//! input lattices (JSON) and the calibration settings. Relative paths are
//! resolved against the job file's directory. Environment variables
//! override the worker count and the iteration cap.

use std::path::{Path, PathBuf};

use pricer_core::market_data::{CurveEnum, CurveInterpolation, CurveSet, InterpolatedCurve};
use pricer_core::types::time::Date;
use pricer_models::swaptions::{AnnuityMappingType, SabrStructure};
use pricer_optimiser::calibration::CubeCalibrationConfig;
use serde::Deserialize;

use crate::{CliError, Result};

/// Overrides `calibration.threads`.
pub const ENV_THREADS: &str = "SABR_CUBE_THREADS";
/// Overrides `calibration.max_iterations`.
pub const ENV_MAX_ITERATIONS: &str = "SABR_CUBE_MAX_ITERATIONS";

/// Zero-rate curve definition.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveSpec {
    /// Constant continuously compounded rate.
    Flat {
        /// Zero rate
        rate: f64,
    },
    /// Pillar curve.
    Interpolated {
        /// Pillar times in years
        times: Vec<f64>,
        /// Zero rates at the pillars
        rates: Vec<f64>,
        /// Interpolation between pillars
        #[serde(default)]
        interpolation: CurveInterpolation,
        /// Hold the end rates flat beyond the pillars
        #[serde(default)]
        extrapolate: bool,
    },
}

impl CurveSpec {
    fn build(&self) -> Result<CurveEnum<f64>> {
        Ok(match self {
            CurveSpec::Flat { rate } => CurveEnum::flat(*rate),
            CurveSpec::Interpolated {
                times,
                rates,
                interpolation,
                extrapolate,
            } => CurveEnum::Interpolated(InterpolatedCurve::new(
                times,
                rates,
                *interpolation,
                *extrapolate,
            )?),
        })
    }
}

/// Input lattice files, JSON.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LatticeInputs {
    /// Cash-settled payer quotes
    pub cash_payer: PathBuf,
    /// Cash-settled receiver quotes
    pub cash_receiver: PathBuf,
    /// Physically settled quotes
    pub physical: PathBuf,
}

/// Optional start-value tables, JSON quote tables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InitialInputs {
    /// Correlation
    pub rho: PathBuf,
    /// Base volatility
    pub base_vol: PathBuf,
    /// Volatility of volatility
    pub vol_vol: PathBuf,
}

/// A calibration job.
#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationJob {
    /// Cube name
    pub name: String,

    /// Valuation date (YYYY-MM-DD)
    pub reference_date: Date,

    /// Tenors to calibrate, in months
    pub tenors: Vec<i32>,

    /// Annuity mapping for cash-settled replication
    #[serde(default)]
    pub mapping: AnnuityMappingType,

    /// Cube output file; stdout when absent
    pub output: Option<PathBuf>,

    /// Curves by name
    #[serde(default)]
    pub curves: std::collections::BTreeMap<String, CurveSpec>,

    /// Input lattices
    pub inputs: LatticeInputs,

    /// Start values
    pub initial: Option<InitialInputs>,

    /// Structural SABR parameters
    #[serde(default)]
    pub structure: SabrStructure,

    /// Solver, threading and replication settings
    #[serde(default)]
    pub calibration: CubeCalibrationConfig,

    #[serde(skip)]
    base_dir: PathBuf,
}

impl CalibrationJob {
    /// Parse a job from TOML text; relative paths resolve against `base_dir`.
    pub fn from_toml(text: &str, base_dir: &Path, origin: &Path) -> Result<Self> {
        let mut job: CalibrationJob = toml::from_str(text).map_err(|source| CliError::JobParse {
            path: origin.to_path_buf(),
            source,
        })?;
        job.base_dir = base_dir.to_path_buf();
        Ok(job)
    }

    /// Load a job from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml(&text, base_dir, path)
    }

    /// Apply environment variable overrides.
    ///
    /// Unparseable values are ignored.
    pub fn with_env_override(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_THREADS).ok().as_deref(),
            std::env::var(ENV_MAX_ITERATIONS).ok().as_deref(),
        )
    }

    fn with_overrides(mut self, threads: Option<&str>, max_iterations: Option<&str>) -> Self {
        if let Some(threads) = threads.and_then(|v| v.trim().parse().ok()) {
            self.calibration.threads = threads;
        }
        if let Some(iterations) = max_iterations.and_then(|v| v.trim().parse().ok()) {
            self.calibration.max_iterations = iterations;
        }
        self
    }

    /// Validate the job, collecting every problem.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("name cannot be empty".to_string());
        }
        if self.tenors.is_empty() {
            errors.push("tenors cannot be empty".to_string());
        }
        if let Some(bad) = self.tenors.iter().find(|&&t| t <= 0) {
            errors.push(format!("tenor {} must be positive", bad));
        }
        let mut sorted = self.tenors.clone();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            errors.push("tenors must be unique".to_string());
        }
        if self.curves.is_empty() {
            errors.push("at least one curve is required".to_string());
        }
        if let Err(e) = self.calibration.validate() {
            errors.push(e.to_string());
        }
        if !(self.structure.displacement >= 0.0) {
            errors.push(format!(
                "structure.displacement {} must be non-negative",
                self.structure.displacement
            ));
        }
        if !(0.0..=1.0).contains(&self.structure.beta) {
            errors.push(format!(
                "structure.beta {} must lie in [0, 1]",
                self.structure.beta
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CliError::Validation(errors))
        }
    }

    /// Load from file with environment overrides and validate.
    pub fn load_with_env_and_validate(path: &Path) -> Result<Self> {
        let job = Self::load(path)?.with_env_override();
        job.validate()?;
        Ok(job)
    }

    /// Path resolved against the job file's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Named curves of the job.
    pub fn curve_set(&self) -> Result<CurveSet<f64>> {
        self.curves
            .iter()
            .try_fold(CurveSet::new(), |set, (name, spec)| {
                Ok(set.with_curve(name.clone(), spec.build()?))
            })
    }
}
