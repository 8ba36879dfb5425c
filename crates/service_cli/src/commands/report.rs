//! Report command implementation
//!
//! Compares a calibrated cube with the quotes of a job: physically settled
//! quotes in normal volatility, cash-settled quotes in price.

use std::fmt::Write as _;
use std::path::Path;

use pricer_models::swaptions::{
    AnnuityMappingType, CashSettledSwaption, QuotingConvention, ReplicationSettings,
    SabrVolatilityCube, SwaptionLattice, SwaptionMarket, SwaptionType,
};
use tracing::{info, warn};

use super::{read_json, JobInputs};
use crate::config::CalibrationJob;
use crate::Result;

/// One physical quote against the cube.
#[derive(Debug, Clone, PartialEq)]
pub struct FitRow {
    /// Maturity in months
    pub maturity: i32,
    /// Tenor in months
    pub tenor: i32,
    /// Moneyness in basis points
    pub moneyness: i32,
    /// Quoted normal volatility
    pub market_vol: f64,
    /// Cube normal volatility
    pub model_vol: f64,
}

impl FitRow {
    /// Model minus market, in basis points of volatility.
    pub fn error_bp(&self) -> f64 {
        (self.model_vol - self.market_vol) * 1e4
    }
}

/// One cash-settled quote repriced from the cube.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    /// Payer or receiver
    pub side: SwaptionType,
    /// Maturity in months
    pub maturity: i32,
    /// Tenor in months
    pub tenor: i32,
    /// Moneyness in basis points
    pub moneyness: i32,
    /// Quoted price
    pub market: f64,
    /// Replicated price under the cube
    pub model: f64,
}

impl PriceRow {
    /// Model minus market, in basis points of notional.
    pub fn error_bp(&self) -> f64 {
        (self.model - self.market) * 1e4
    }
}

/// Fit of a cube to the quotes it was calibrated on.
#[derive(Debug, Clone, Default)]
pub struct FitReport {
    /// Physical normal-vol rows in lattice order
    pub rows: Vec<FitRow>,
    /// Cash payer rows then cash receiver rows
    pub prices: Vec<PriceRow>,
}

impl FitReport {
    /// Evaluates the cube at every quote whose tenor it covers.
    ///
    /// Cash quotes are replicated with `mapping` and `replication`, which
    /// should be the settings the cube was calibrated with.
    pub fn build(
        cube: &SabrVolatilityCube,
        inputs: &JobInputs,
        mapping: AnnuityMappingType,
        replication: ReplicationSettings,
    ) -> Result<Self> {
        let rows = vol_rows(cube, &inputs.physical, &inputs.market)?;

        let market = inputs.market.with_volatility_cube(cube.clone());
        let mut prices = Vec::new();
        for (lattice, side) in [
            (&inputs.cash_payer, SwaptionType::Payer),
            (&inputs.cash_receiver, SwaptionType::Receiver),
        ] {
            prices.extend(price_rows(cube, lattice, side, &market, mapping, replication)?);
        }
        Ok(Self { rows, prices })
    }

    /// Root mean square vol error in basis points; zero when empty.
    pub fn rms_bp(&self) -> f64 {
        rms(self.rows.iter().map(FitRow::error_bp))
    }

    /// Largest absolute vol error in basis points.
    pub fn max_abs_bp(&self) -> f64 {
        max_abs(self.rows.iter().map(FitRow::error_bp))
    }

    /// Root mean square price error in basis points of notional.
    pub fn price_rms_bp(&self) -> f64 {
        rms(self.prices.iter().map(PriceRow::error_bp))
    }

    /// Largest absolute price error in basis points of notional.
    pub fn price_max_abs_bp(&self) -> f64 {
        max_abs(self.prices.iter().map(PriceRow::error_bp))
    }

    /// Text tables of the rows.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "┌──────────┬──────────┬──────────┬────────────┬────────────┬──────────┐"
        );
        let _ = writeln!(
            out,
            "│ Maturity │ Tenor    │ Money bp │ Market bp  │ Model bp   │ Error bp │"
        );
        let _ = writeln!(
            out,
            "├──────────┼──────────┼──────────┼────────────┼────────────┼──────────┤"
        );
        for row in &self.rows {
            let _ = writeln!(
                out,
                "│ {:>7}M │ {:>7}M │ {:>8} │ {:>10.4} │ {:>10.4} │ {:>8.4} │",
                row.maturity,
                row.tenor,
                row.moneyness,
                row.market_vol * 1e4,
                row.model_vol * 1e4,
                row.error_bp()
            );
        }
        let _ = writeln!(
            out,
            "└──────────┴──────────┴──────────┴────────────┴────────────┴──────────┘"
        );
        let _ = writeln!(
            out,
            "Physical vols: RMS {:.4} bp, max {:.4} bp over {} quotes",
            self.rms_bp(),
            self.max_abs_bp(),
            self.rows.len()
        );

        let _ = writeln!(
            out,
            "┌──────────┬──────────┬──────────┬──────────┬────────────┬────────────┬──────────┐"
        );
        let _ = writeln!(
            out,
            "│ Side     │ Maturity │ Tenor    │ Money bp │ Market     │ Model      │ Error bp │"
        );
        let _ = writeln!(
            out,
            "├──────────┼──────────┼──────────┼──────────┼────────────┼────────────┼──────────┤"
        );
        for row in &self.prices {
            let _ = writeln!(
                out,
                "│ {:<8} │ {:>7}M │ {:>7}M │ {:>8} │ {:>10.6} │ {:>10.6} │ {:>8.4} │",
                row.side.to_string(),
                row.maturity,
                row.tenor,
                row.moneyness,
                row.market,
                row.model,
                row.error_bp()
            );
        }
        let _ = writeln!(
            out,
            "└──────────┴──────────┴──────────┴──────────┴────────────┴────────────┴──────────┘"
        );
        let _ = writeln!(
            out,
            "Cash prices: RMS {:.4} bp, max {:.4} bp over {} quotes",
            self.price_rms_bp(),
            self.price_max_abs_bp(),
            self.prices.len()
        );
        out
    }
}

fn rms(errors: impl Iterator<Item = f64>) -> f64 {
    let (ss, n) = errors.fold((0.0, 0usize), |(ss, n), e| (ss + e * e, n + 1));
    if n == 0 {
        0.0
    } else {
        (ss / n as f64).sqrt()
    }
}

fn max_abs(errors: impl Iterator<Item = f64>) -> f64 {
    errors.map(f64::abs).fold(0.0, f64::max)
}

/// `market` must hold the curves of the lattice.
fn vol_rows(
    cube: &SabrVolatilityCube,
    physical: &SwaptionLattice,
    market: &SwaptionMarket,
) -> Result<Vec<FitRow>> {
    let quotes = physical.convert(QuotingConvention::PayerVolNormal, market)?;
    let covered = cube.tenors();

    let mut rows = Vec::with_capacity(quotes.len());
    for point in quotes.iter() {
        if covered.binary_search(&point.tenor).is_err() {
            continue;
        }
        let swap = quotes
            .meta()
            .terms(point.maturity, point.tenor)
            .forward_swap(market)?;
        let strike = SwaptionType::Payer.strike(swap.par_rate(), point.moneyness);
        let model_vol = cube.normal_vol(
            point.maturity as f64,
            point.tenor,
            swap.par_rate(),
            strike,
            swap.expiry(),
        )?;
        rows.push(FitRow {
            maturity: point.maturity,
            tenor: point.tenor,
            moneyness: point.moneyness,
            market_vol: point.value,
            model_vol,
        });
    }
    Ok(rows)
}

/// `market` must hold the curves of the lattice and the cube.
fn price_rows(
    cube: &SabrVolatilityCube,
    lattice: &SwaptionLattice,
    side: SwaptionType,
    market: &SwaptionMarket,
    mapping: AnnuityMappingType,
    replication: ReplicationSettings,
) -> Result<Vec<PriceRow>> {
    let target = match side {
        SwaptionType::Payer => QuotingConvention::PayerPrice,
        SwaptionType::Receiver => QuotingConvention::ReceiverPrice,
    };
    let quotes = lattice.convert(target, market)?;
    let covered = cube.tenors();

    let mut rows = Vec::with_capacity(quotes.len());
    for point in quotes.iter() {
        if covered.binary_search(&point.tenor).is_err() {
            continue;
        }
        let terms = quotes.meta().terms(point.maturity, point.tenor);
        let par = terms.forward_swap(market)?.par_rate();
        let model = CashSettledSwaption::new(
            side,
            side.strike(par, point.moneyness),
            terms,
            cube.name(),
            mapping,
        )
        .with_replication(replication)
        .value(market)?;
        rows.push(PriceRow {
            side,
            maturity: point.maturity,
            tenor: point.tenor,
            moneyness: point.moneyness,
            market: point.value,
            model,
        });
    }
    Ok(rows)
}

/// Run the report command on a cube written by `calibrate`.
pub fn run(job_path: &Path, cube_path: &Path) -> Result<()> {
    let job = CalibrationJob::load_with_env_and_validate(job_path)?;
    let cube: SabrVolatilityCube = read_json(cube_path)?;
    if cube.reference_date() != job.reference_date {
        warn!(
            cube = %cube.reference_date(),
            job = %job.reference_date,
            "cube and job valuation dates differ"
        );
    }

    let inputs = JobInputs::load(&job)?;
    let report = FitReport::build(&cube, &inputs, job.mapping, job.calibration.replication)?;
    info!(
        cube = cube.name(),
        vol_quotes = report.rows.len(),
        price_quotes = report.prices.len(),
        vol_rms_bp = report.rms_bp(),
        price_rms_bp = report.price_rms_bp(),
        "fit report"
    );
    print!("{}", report.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::{CurveEnum, CurveSet};
    use pricer_core::types::time::{Date, DayCountConvention};
    use pricer_models::schedules::{Frequency, SchedulePrototype};
    use pricer_models::swaptions::{
        LatticeMeta, SabrNode, SabrStructure, Settlement, TenorSmile,
    };

    const MAPPING: AnnuityMappingType = AnnuityMappingType::BasicPiterbarg;

    fn date() -> Date {
        Date::from_ymd(2017, 8, 30).unwrap()
    }

    fn market() -> SwaptionMarket {
        SwaptionMarket::new(
            CurveSet::new()
                .with_curve("discount", CurveEnum::flat(0.01))
                .with_curve("forward", CurveEnum::flat(0.015)),
        )
    }

    fn flat_cube(vol: f64) -> SabrVolatilityCube {
        let structure = SabrStructure {
            beta: 0.0,
            ..SabrStructure::default()
        };
        let node = SabrNode {
            base_vol: vol,
            vol_vol: 0.0,
            rho: 0.0,
        };
        let smile = TenorSmile::new(60, [(12, node)]).unwrap();
        SabrVolatilityCube::new("EUR", date(), structure, [smile])
    }

    fn meta(convention: QuotingConvention, settlement: Settlement) -> LatticeMeta {
        LatticeMeta {
            reference_date: date(),
            convention,
            settlement,
            displacement: 0.0,
            discount_curve: "discount".into(),
            forward_curve: "forward".into(),
            fixed_leg: SchedulePrototype::new(Frequency::Annual, DayCountConvention::Thirty360),
            floating_leg: SchedulePrototype::new(
                Frequency::SemiAnnual,
                DayCountConvention::ActualActual360,
            ),
        }
    }

    fn quotes() -> SwaptionLattice {
        SwaptionLattice::builder(meta(QuotingConvention::PayerVolNormal, Settlement::Physical))
            .with_entry(12, 60, 0, 0.0060)
            .unwrap()
            .with_entry(12, 120, 0, 0.0065)
            .unwrap()
            .build()
    }

    fn inputs(cash_payer: SwaptionLattice, cash_receiver: SwaptionLattice) -> JobInputs {
        JobInputs {
            market: market(),
            cash_payer,
            cash_receiver,
            physical: quotes(),
        }
    }

    fn no_cash() -> JobInputs {
        inputs(
            SwaptionLattice::builder(meta(QuotingConvention::PayerPrice, Settlement::Cash)).build(),
            SwaptionLattice::builder(meta(QuotingConvention::ReceiverPrice, Settlement::Cash))
                .build(),
        )
    }

    /// Cash price of a 12M x 60M swaption under `cube`.
    fn cash_price(cube: &SabrVolatilityCube, side: SwaptionType, moneyness: i32) -> f64 {
        let market = market().with_volatility_cube(cube.clone());
        let terms = meta(QuotingConvention::PayerPrice, Settlement::Cash).terms(12, 60);
        let par = terms.forward_swap(&market).unwrap().par_rate();
        CashSettledSwaption::new(side, side.strike(par, moneyness), terms, "EUR", MAPPING)
            .with_replication(ReplicationSettings::default())
            .value(&market)
            .unwrap()
    }

    fn build(cube: &SabrVolatilityCube, inputs: &JobInputs) -> FitReport {
        FitReport::build(cube, inputs, MAPPING, ReplicationSettings::default()).unwrap()
    }

    #[test]
    fn test_report_skips_uncovered_tenors() {
        let report = build(&flat_cube(0.0061), &no_cash());

        assert_eq!(report.rows.len(), 1);
        assert!(report.prices.is_empty());
        let row = &report.rows[0];
        assert_eq!((row.maturity, row.tenor, row.moneyness), (12, 60, 0));
        assert_relative_eq!(row.market_vol, 0.0060, epsilon = 1e-10);
        assert_relative_eq!(row.model_vol, 0.0061, epsilon = 1e-10);
        assert_relative_eq!(report.rms_bp(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(report.max_abs_bp(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_report_reprices_cash_quotes() {
        let cube = flat_cube(0.0060);
        let payer = cash_price(&cube, SwaptionType::Payer, 50);
        let receiver = cash_price(&cube, SwaptionType::Receiver, 50);

        let payers = SwaptionLattice::builder(meta(QuotingConvention::PayerPrice, Settlement::Cash))
            .with_entry(12, 60, 50, payer)
            .unwrap()
            .with_entry(12, 120, 50, 0.01)
            .unwrap()
            .build();
        let receivers =
            SwaptionLattice::builder(meta(QuotingConvention::ReceiverPrice, Settlement::Cash))
                .with_entry(12, 60, 50, receiver + 1e-4)
                .unwrap()
                .build();
        let report = build(&cube, &inputs(payers, receivers));

        assert_eq!(report.prices.len(), 2);
        let (p, r) = (&report.prices[0], &report.prices[1]);
        assert_eq!((p.side, p.tenor, p.moneyness), (SwaptionType::Payer, 60, 50));
        assert_eq!(r.side, SwaptionType::Receiver);
        assert_relative_eq!(p.error_bp(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(r.error_bp(), -1.0, epsilon = 1e-9);
        assert_relative_eq!(report.price_max_abs_bp(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(report.price_rms_bp(), 0.5_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_render() {
        let cube = flat_cube(0.0060);
        let payer = cash_price(&cube, SwaptionType::Payer, 0);
        let payers = SwaptionLattice::builder(meta(QuotingConvention::PayerPrice, Settlement::Cash))
            .with_entry(12, 60, 0, payer)
            .unwrap()
            .build();
        let receivers =
            SwaptionLattice::builder(meta(QuotingConvention::ReceiverPrice, Settlement::Cash))
                .build();
        let table = build(&cube, &inputs(payers, receivers)).render();
        assert!(table.contains("60M"));
        assert!(table.contains("payer"));
        assert!(table.contains("Physical vols: RMS 0.0000 bp, max 0.0000 bp over 1 quotes"));
        assert!(table.contains("Cash prices: RMS 0.0000 bp, max 0.0000 bp over 1 quotes"));
    }

    #[test]
    fn test_empty_report() {
        let report = FitReport::default();
        assert_eq!(report.rms_bp(), 0.0);
        assert_eq!(report.max_abs_bp(), 0.0);
        assert_eq!(report.price_rms_bp(), 0.0);
        assert_eq!(report.price_max_abs_bp(), 0.0);
    }
}
