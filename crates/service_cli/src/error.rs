//! CLI error types.

use std::path::PathBuf;

use pricer_core::market_data::MarketDataError;
use pricer_models::swaptions::SwaptionError;
use pricer_optimiser::OptimiserError;
use thiserror::Error;

/// Errors surfaced by `sabr-cube` commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A referenced file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The job file is not valid TOML for a calibration job.
    #[error("Invalid job file {}: {source}", path.display())]
    JobParse {
        /// Job file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// An input or output JSON document failed to (de)serialise.
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// The job failed validation.
    #[error("Invalid job: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Command line argument rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Curve or quote-table failure.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Lattice or pricing failure.
    #[error(transparent)]
    Swaption(#[from] SwaptionError),

    /// Calibration failure.
    #[error(transparent)]
    Calibration(#[from] OptimiserError),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
