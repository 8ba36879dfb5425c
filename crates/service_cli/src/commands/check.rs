//! Check command implementation
//!
//! Validates a job and its inputs without calibrating.

use std::path::Path;

use pricer_models::swaptions::{Settlement, SwaptionLattice};
use tracing::{info, warn};

use super::JobInputs;
use crate::config::CalibrationJob;
use crate::{CliError, Result};

/// Problems that would make a calibration fail up front.
pub fn input_problems(job: &CalibrationJob, inputs: &JobInputs) -> Vec<String> {
    let mut problems = Vec::new();

    let expected = [Settlement::Cash, Settlement::Cash, Settlement::Physical];
    for ((label, lattice), settlement) in inputs.lattices().into_iter().zip(expected) {
        if lattice.settlement() != settlement {
            problems.push(format!(
                "{} lattice is {}-settled, expected {}",
                label,
                lattice.settlement(),
                settlement
            ));
        }
        if lattice.reference_date() != job.reference_date {
            problems.push(format!(
                "{} lattice is dated {}, job is dated {}",
                label,
                lattice.reference_date(),
                job.reference_date
            ));
        }
        for curve in [&lattice.meta().discount_curve, &lattice.meta().forward_curve] {
            if inputs.market.curve(curve).is_err() {
                problems.push(format!("{} lattice needs missing curve '{}'", label, curve));
            }
        }
    }

    for &tenor in &job.tenors {
        let quoted = |l: &SwaptionLattice| l.tenor_slice(tenor).next().is_some();
        if !inputs.lattices().iter().any(|(_, l)| quoted(*l)) {
            problems.push(format!("no quotes for tenor {}M", tenor));
        }
    }

    problems
}

/// Run the check command
pub fn run(job_path: &Path) -> Result<()> {
    let job = CalibrationJob::load_with_env_and_validate(job_path)?;
    let inputs = JobInputs::load(&job)?;

    for (label, lattice) in inputs.lattices() {
        info!(
            lattice = label,
            convention = %lattice.convention(),
            settlement = %lattice.settlement(),
            quotes = lattice.len(),
            tenors = ?lattice.tenors(),
            "loaded"
        );
    }

    let problems = input_problems(&job, &inputs);
    if problems.is_empty() {
        info!("Job {} is ready to calibrate", job.name);
        Ok(())
    } else {
        for problem in &problems {
            warn!("{}", problem);
        }
        Err(CliError::Validation(problems))
    }
}
