//! SABR cube calibration configuration.

use pricer_core::traits::ParameterBounds;
use pricer_models::swaptions::ReplicationSettings;

use crate::OptimiserError;

/// Weight of each observation family in the least-squares residual.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ObservationWeights {
    /// Cash-settled payer prices.
    pub cash_payer: f64,
    /// Cash-settled receiver prices.
    pub cash_receiver: f64,
    /// Physically settled prices.
    pub physical: f64,
}

impl Default for ObservationWeights {
    fn default() -> Self {
        Self {
            cash_payer: 1.0,
            cash_receiver: 1.0,
            physical: 1.0,
        }
    }
}

/// Box constraints on the calibrated SABR parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SabrBounds {
    /// Correlation.
    pub rho: ParameterBounds,
    /// Base volatility.
    pub base_vol: ParameterBounds,
    /// Volatility of volatility.
    pub vol_vol: ParameterBounds,
}

impl Default for SabrBounds {
    fn default() -> Self {
        Self {
            rho: ParameterBounds::correlation(),
            base_vol: ParameterBounds::positive(),
            vol_vol: ParameterBounds::positive(),
        }
    }
}

impl SabrBounds {
    /// Bounds in solver order: (rho, base vol, vol-of-vol).
    pub fn triple(&self) -> [ParameterBounds; 3] {
        [self.rho, self.base_vol, self.vol_vol]
    }
}

/// Settings of [`SabrCubeCalibrator`](super::SabrCubeCalibrator).
///
/// # Examples
///
/// ```
/// use pricer_optimiser::calibration::CubeCalibrationConfig;
///
/// let config = CubeCalibrationConfig::default()
///     .with_threads(4)
///     .with_max_iterations(50);
/// assert!(config.validate().is_ok());
/// assert!(config.with_threads(0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CubeCalibrationConfig {
    /// Levenberg-Marquardt iteration cap per tenor.
    pub max_iterations: usize,
    /// Worker threads; one tenor per task.
    pub threads: usize,
    /// Replication grid for cash-settled observations.
    pub replication: ReplicationSettings,
    /// RMS residual accepted when the iteration cap is hit.
    pub max_rms_error: f64,
    /// Observation weights.
    pub weights: ObservationWeights,
    /// Parameter bounds.
    pub bounds: SabrBounds,
}

impl Default for CubeCalibrationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            threads: num_cpus::get(),
            replication: ReplicationSettings::default(),
            max_rms_error: 1e-3,
            weights: ObservationWeights::default(),
            bounds: SabrBounds::default(),
        }
    }
}

impl CubeCalibrationConfig {
    /// Override the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Override the worker count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Override the replication grid.
    pub fn with_replication(mut self, replication: ReplicationSettings) -> Self {
        self.replication = replication;
        self
    }

    /// Override the accepted RMS residual.
    pub fn with_max_rms_error(mut self, max_rms_error: f64) -> Self {
        self.max_rms_error = max_rms_error;
        self
    }

    /// Override the observation weights.
    pub fn with_weights(mut self, weights: ObservationWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Override the parameter bounds.
    pub fn with_bounds(mut self, bounds: SabrBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Check the settings before a run.
    pub fn validate(&self) -> Result<(), OptimiserError> {
        if self.threads == 0 {
            return Err(OptimiserError::InvalidConfig(
                "threads must be at least 1".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(OptimiserError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.max_rms_error > 0.0) {
            return Err(OptimiserError::InvalidConfig(format!(
                "max_rms_error must be positive, got {}",
                self.max_rms_error
            )));
        }
        let w = &self.weights;
        if [w.cash_payer, w.cash_receiver, w.physical]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(OptimiserError::InvalidConfig(
                "observation weights must be finite and non-negative".to_string(),
            ));
        }
        if let Some(name) = ["rho", "base_vol", "vol_vol"]
            .iter()
            .zip(self.bounds.triple())
            .find_map(|(name, b)| (!b.is_valid()).then_some(name))
        {
            return Err(OptimiserError::InvalidConfig(format!(
                "empty bounds for {}",
                name
            )));
        }
        self.replication.validate()?;
        Ok(())
    }
}
