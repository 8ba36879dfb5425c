//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod calibrate;
pub mod check;
pub mod price;
pub mod report;

use std::path::Path;

use pricer_models::swaptions::{SwaptionLattice, SwaptionMarket};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::CalibrationJob;
use crate::{CliError, Result};

/// Curves and quote lattices referenced by a job.
pub struct JobInputs {
    /// Curves of the job, no cube yet
    pub market: SwaptionMarket,
    /// Cash-settled payer quotes
    pub cash_payer: SwaptionLattice,
    /// Cash-settled receiver quotes
    pub cash_receiver: SwaptionLattice,
    /// Physically settled quotes
    pub physical: SwaptionLattice,
}

impl JobInputs {
    /// Reads the curves and lattices of a job.
    pub fn load(job: &CalibrationJob) -> Result<Self> {
        let market = SwaptionMarket::new(job.curve_set()?);
        Ok(Self {
            market,
            cash_payer: read_json(&job.resolve(&job.inputs.cash_payer))?,
            cash_receiver: read_json(&job.resolve(&job.inputs.cash_receiver))?,
            physical: read_json(&job.resolve(&job.inputs.physical))?,
        })
    }

    /// The three lattices with a label each.
    pub fn lattices(&self) -> [(&'static str, &SwaptionLattice); 3] {
        [
            ("cash payer", &self.cash_payer),
            ("cash receiver", &self.cash_receiver),
            ("physical", &self.physical),
        ]
    }
}

/// Deserialise a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.to_path_buf()));
    }
    debug!(path = %path.display(), "reading JSON");
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}
