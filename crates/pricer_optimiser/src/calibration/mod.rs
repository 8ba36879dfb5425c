//! Swaption-cube calibration.
//!
//! - [`SabrCubeCalibrator`]: per-tenor SABR fits to cash and physical quotes
//! - [`CubeCalibrationConfig`]: iteration cap, threads, replication grid, weights

mod config;
mod sabr_cube;

pub use config::{CubeCalibrationConfig, ObservationWeights, SabrBounds};
pub use sabr_cube::SabrCubeCalibrator;
