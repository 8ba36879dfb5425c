//! Optimiser error types.

use pricer_core::market_data::MarketDataError;
use pricer_models::swaptions::SwaptionError;
use thiserror::Error;

/// Errors raised while calibrating a SABR cube.
///
/// Tenor failures name the tenor, in months.
///
/// # Examples
///
/// ```
/// use pricer_optimiser::OptimiserError;
///
/// let err = OptimiserError::SolverFailure {
///     tenor: 120,
///     reason: "RMS residual 2.1e-2 above 1.0e-3".into(),
/// };
/// assert!(err.to_string().contains("120"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimiserError {
    /// The least-squares fit of one tenor failed or missed the accuracy target.
    #[error("Calibration of tenor {tenor}M failed: {reason}")]
    SolverFailure {
        /// Tenor in months
        tenor: i32,
        /// Underlying cause
        reason: String,
    },

    /// No quote in any input lattice for the tenor.
    #[error("No observations for tenor {tenor}M")]
    NoObservations {
        /// Tenor in months
        tenor: i32,
    },

    /// Building or pricing the observations of one tenor failed.
    #[error("Tenor {tenor}M: {source}")]
    TenorFailed {
        /// Tenor in months
        tenor: i32,
        /// Underlying cause
        #[source]
        source: SwaptionError,
    },

    /// The worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Calibration settings are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Quote conversion or pricing failure.
    #[error(transparent)]
    Swaption(#[from] SwaptionError),

    /// Initial-guess table failure.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
}
