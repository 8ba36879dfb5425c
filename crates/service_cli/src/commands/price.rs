//! Price command implementation
//!
//! Prices one swaption from a calibrated cube, on the curves and leg
//! conventions of a job.

use std::fmt::Write as _;
use std::path::Path;

use pricer_models::swaptions::{
    AnnuityMappingType, CashSettledSwaption, PhysicalSwaption, ReplicationSettings,
    SabrVolatilityCube, SwaptionType,
};
use tracing::info;

use super::{read_json, JobInputs};
use crate::config::CalibrationJob;
use crate::{CliError, Result};

/// Swaption to price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRequest {
    /// Payer or receiver
    pub side: SwaptionType,
    /// Strike offset from par in basis points
    pub moneyness: i32,
    /// Months to expiry
    pub maturity: i32,
    /// Swap length in months
    pub tenor: i32,
}

/// Values of one swaption under the cube.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    /// What was priced
    pub request: PriceRequest,
    /// Forward par rate
    pub forward: f64,
    /// Absolute strike
    pub strike: f64,
    /// Cube normal volatility at the strike
    pub normal_vol: f64,
    /// Cash-settled premium
    pub cash: f64,
    /// Physically settled premium
    pub physical: f64,
}

impl PriceQuote {
    /// Text summary.
    pub fn render(&self) -> String {
        let r = &self.request;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {}M x {}M at par {:+} bp",
            r.side, r.maturity, r.tenor, r.moneyness
        );
        let _ = writeln!(out, "  forward     {:.6}", self.forward);
        let _ = writeln!(out, "  strike      {:.6}", self.strike);
        let _ = writeln!(out, "  normal vol  {:.4} bp", self.normal_vol * 1e4);
        let _ = writeln!(out, "  cash        {:.8}", self.cash);
        let _ = writeln!(out, "  physical    {:.8}", self.physical);
        out
    }
}

/// Parses `payer`/`p` or `receiver`/`r`.
pub fn parse_side(text: &str) -> std::result::Result<SwaptionType, String> {
    match text.trim().to_ascii_lowercase().as_str() {
        "p" | "payer" => Ok(SwaptionType::Payer),
        "r" | "receiver" => Ok(SwaptionType::Receiver),
        other => Err(format!("expected payer (p) or receiver (r), got '{}'", other)),
    }
}

/// Prices `request` under `cube`.
///
/// Cash legs follow the job's cash payer lattice, physical legs its physical
/// lattice.
pub fn price(
    cube: &SabrVolatilityCube,
    inputs: &JobInputs,
    mapping: AnnuityMappingType,
    replication: ReplicationSettings,
    request: PriceRequest,
) -> Result<PriceQuote> {
    if request.maturity <= 0 || request.tenor <= 0 {
        return Err(CliError::InvalidArgument(format!(
            "maturity {}M and tenor {}M must be positive",
            request.maturity, request.tenor
        )));
    }

    let market = inputs.market.with_volatility_cube(cube.clone());
    let side = request.side;

    let cash_terms = inputs
        .cash_payer
        .meta()
        .terms(request.maturity, request.tenor);
    let swap = cash_terms.forward_swap(&market)?;
    let forward = swap.par_rate();
    let strike = side.strike(forward, request.moneyness);
    let normal_vol = cube.normal_vol(
        request.maturity as f64,
        request.tenor,
        forward,
        strike,
        swap.expiry(),
    )?;

    let cash = CashSettledSwaption::new(side, strike, cash_terms, cube.name(), mapping)
        .with_replication(replication)
        .value(&market)?;

    let physical_terms = inputs
        .physical
        .meta()
        .terms(request.maturity, request.tenor);
    let physical_strike = side.strike(
        physical_terms.forward_swap(&market)?.par_rate(),
        request.moneyness,
    );
    let physical =
        PhysicalSwaption::new(side, physical_strike, physical_terms, cube.name()).value(&market)?;

    Ok(PriceQuote {
        request,
        forward,
        strike,
        normal_vol,
        cash,
        physical,
    })
}

/// Run the price command on a cube written by `calibrate`.
pub fn run(job_path: &Path, cube_path: &Path, request: PriceRequest) -> Result<()> {
    let job = CalibrationJob::load_with_env_and_validate(job_path)?;
    let cube: SabrVolatilityCube = read_json(cube_path)?;
    let inputs = JobInputs::load(&job)?;

    let quote = price(
        &cube,
        &inputs,
        job.mapping,
        job.calibration.replication,
        request,
    )?;
    info!(
        cube = cube.name(),
        side = %request.side,
        maturity = request.maturity,
        tenor = request.tenor,
        moneyness = request.moneyness,
        cash = quote.cash,
        physical = quote.physical,
        "priced"
    );
    print!("{}", quote.render());
    Ok(())
}
