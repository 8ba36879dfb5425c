//! Integration tests for SABR cube calibration.
//!
//! Quotes are generated from a known cube with the same replication grid the
//! calibrator uses, so an exact fit exists.

use approx::assert_abs_diff_eq;
use pricer_core::market_data::{CurveEnum, CurveSet};
use pricer_core::types::time::{Date, DayCountConvention};
use pricer_models::schedules::{Frequency, SchedulePrototype};
use pricer_models::swaptions::{
    AnnuityMappingType, CashSettledSwaption, LatticeMeta, PhysicalSwaption, QuotingConvention,
    ReplicationSettings, SabrNode, SabrStructure, SabrVolatilityCube, Settlement, SwaptionLattice,
    SwaptionMarket, SwaptionType, TenorSmile,
};
use pricer_optimiser::calibration::{CubeCalibrationConfig, SabrCubeCalibrator};
use pricer_optimiser::OptimiserError;
use proptest::prelude::*;

const TENORS: [i32; 3] = [12, 60, 120];
const MATURITIES: [i32; 2] = [12, 60];
const MONEYNESS: [i32; 3] = [0, 50, 100];
const POINTS: usize = 101;
const BASIC: AnnuityMappingType = AnnuityMappingType::BasicPiterbarg;

// ============================================================================
// Fixtures
// ============================================================================

fn reference_date() -> Date {
    Date::from_ymd(2017, 8, 30).unwrap()
}

fn curves() -> SwaptionMarket {
    SwaptionMarket::new(
        CurveSet::new()
            .with_curve("discount", CurveEnum::flat(0.01))
            .with_curve("forward", CurveEnum::flat(0.015)),
    )
}

fn meta(convention: QuotingConvention, settlement: Settlement) -> LatticeMeta {
    LatticeMeta {
        reference_date: reference_date(),
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

fn true_node(maturity: i32, tenor: i32) -> SabrNode {
    let m = maturity as f64 / 12.0;
    let t = tenor as f64 / 12.0;
    SabrNode {
        rho: -0.25 + 0.02 * t,
        base_vol: 0.012 + 0.0005 * m,
        vol_vol: 0.45 - 0.03 * m,
    }
}

fn true_cube() -> SabrVolatilityCube {
    let smiles = TENORS.iter().map(|&tenor| {
        TenorSmile::new(
            tenor,
            MATURITIES.iter().map(|&m| (m, true_node(m, tenor))),
        )
        .unwrap()
    });
    SabrVolatilityCube::new("TRUE", reference_date(), SabrStructure::default(), smiles)
}

struct Quotes {
    cash_payer: SwaptionLattice,
    cash_receiver: SwaptionLattice,
    physical: SwaptionLattice,
}

fn generate_quotes(mapping: AnnuityMappingType) -> Quotes {
    let market = curves().with_volatility_cube(true_cube());
    let replication = ReplicationSettings {
        points: POINTS,
        ..ReplicationSettings::default()
    };

    let mut payers =
        SwaptionLattice::builder(meta(QuotingConvention::PayerPrice, Settlement::Cash));
    let mut receivers =
        SwaptionLattice::builder(meta(QuotingConvention::ReceiverPrice, Settlement::Cash));
    let mut physical =
        SwaptionLattice::builder(meta(QuotingConvention::PayerPrice, Settlement::Physical));

    for &tenor in &TENORS {
        for &maturity in &MATURITIES {
            let terms =
                meta(QuotingConvention::PayerPrice, Settlement::Cash).terms(maturity, tenor);
            let par = terms.forward_swap(&market).unwrap().par_rate();

            for &m in &MONEYNESS {
                for (side, builder) in [
                    (SwaptionType::Payer, &mut payers),
                    (SwaptionType::Receiver, &mut receivers),
                ] {
                    let price = CashSettledSwaption::new(
                        side,
                        side.strike(par, m),
                        terms.clone(),
                        "TRUE",
                        mapping,
                    )
                    .with_replication(replication)
                    .value(&market)
                    .unwrap();
                    builder.insert(maturity, tenor, m, price).unwrap();
                }
            }

            let atm = PhysicalSwaption::new(SwaptionType::Payer, par, terms, "TRUE")
                .value(&market)
                .unwrap();
            physical.insert(maturity, tenor, 0, atm).unwrap();
        }
    }

    Quotes {
        cash_payer: payers.build(),
        cash_receiver: receivers.build(),
        physical: physical.build(),
    }
}

fn calibrator(quotes: &Quotes, mapping: AnnuityMappingType) -> SabrCubeCalibrator {
    SabrCubeCalibrator::new(
        reference_date(),
        quotes.cash_payer.clone(),
        quotes.cash_receiver.clone(),
        quotes.physical.clone(),
        curves(),
        mapping,
        SabrStructure::default(),
    )
    .set_calibration_parameters(200, 2)
    .set_replication_parameters(true, -0.1, 0.1, POINTS)
}

// ============================================================================
// End-to-End Calibration
// ============================================================================

fn assert_recovers_generating_cube(mapping: AnnuityMappingType) {
    let quotes = generate_quotes(mapping);
    let cube = calibrator(&quotes, mapping).calibrate("EUR", &TENORS).unwrap();

    assert_eq!(cube.name(), "EUR");
    assert_eq!(cube.tenors(), TENORS.to_vec());

    for &tenor in &TENORS {
        let smile = cube.smile(tenor).unwrap();
        assert_eq!(smile.maturities(), MATURITIES.to_vec());
        for &maturity in &MATURITIES {
            let fitted = smile.node(maturity).unwrap();
            let expected = true_node(maturity, tenor);
            assert_abs_diff_eq!(fitted.base_vol, expected.base_vol, epsilon = 1e-4);
            assert_abs_diff_eq!(fitted.rho, expected.rho, epsilon = 2e-2);
            assert_abs_diff_eq!(fitted.vol_vol, expected.vol_vol, epsilon = 2e-2);
        }
    }
}

fn assert_reprices_cash_quotes(mapping: AnnuityMappingType) {
    let quotes = generate_quotes(mapping);
    let cube = calibrator(&quotes, mapping).calibrate("EUR", &TENORS).unwrap();
    let market = curves().with_volatility_cube(cube);
    let replication = ReplicationSettings {
        points: POINTS,
        ..ReplicationSettings::default()
    };

    for (lattice, side) in [
        (&quotes.cash_payer, SwaptionType::Payer),
        (&quotes.cash_receiver, SwaptionType::Receiver),
    ] {
        for point in lattice.iter() {
            let terms = lattice.meta().terms(point.maturity, point.tenor);
            let par = terms.forward_swap(&market).unwrap().par_rate();
            let model = CashSettledSwaption::new(
                side,
                side.strike(par, point.moneyness),
                terms,
                "EUR",
                mapping,
            )
            .with_replication(replication)
            .value(&market)
            .unwrap();
            assert_abs_diff_eq!(model, point.value, epsilon = 1e-6);
        }
    }
}

/// Calibration recovers the generating parameters.
#[test]
fn test_recovers_generating_cube_basic_mapping() {
    assert_recovers_generating_cube(AnnuityMappingType::BasicPiterbarg);
}

/// Same with the one-factor mapping solved inside every residual.
#[test]
fn test_recovers_generating_cube_multi_mapping() {
    assert_recovers_generating_cube(AnnuityMappingType::MultiPiterbarg);
}

/// The calibrated cube reprices its own cash inputs.
#[test]
fn test_calibrated_cube_reprices_quotes_basic_mapping() {
    assert_reprices_cash_quotes(AnnuityMappingType::BasicPiterbarg);
}

#[test]
fn test_calibrated_cube_reprices_quotes_multi_mapping() {
    assert_reprices_cash_quotes(AnnuityMappingType::MultiPiterbarg);
}

// ============================================================================
// Parallel Execution
// ============================================================================

/// The worker count does not change the result.
#[test]
fn test_thread_count_independence() {
    let quotes = generate_quotes(BASIC);
    let single = calibrator(&quotes, BASIC)
        .set_calibration_parameters(200, 1)
        .calibrate("EUR", &TENORS)
        .unwrap();
    let multi = calibrator(&quotes, BASIC)
        .set_calibration_parameters(200, 3)
        .calibrate("EUR", &TENORS)
        .unwrap();

    for &tenor in &TENORS {
        assert_eq!(single.smile(tenor).unwrap(), multi.smile(tenor).unwrap());
    }
}

/// Tenors are independent problems.
#[test]
fn test_single_tenor_matches_joint_run() {
    let quotes = generate_quotes(BASIC);
    let joint = calibrator(&quotes, BASIC).calibrate("EUR", &TENORS).unwrap();
    let alone = calibrator(&quotes, BASIC).calibrate("EUR", &[60]).unwrap();

    assert_eq!(alone.tenors(), vec![60]);
    assert_eq!(alone.smile(60).unwrap(), joint.smile(60).unwrap());
}

// ============================================================================
// Failures
// ============================================================================

/// A tenor without quotes fails the whole cube.
#[test]
fn test_missing_tenor_fails_cube() {
    let quotes = generate_quotes(BASIC);
    let result = calibrator(&quotes, BASIC).calibrate("EUR", &[12, 240]);
    assert_eq!(
        result.unwrap_err(),
        OptimiserError::NoObservations { tenor: 240 }
    );
}

/// Quotes no single smile can fit abort the cube and name the tenor.
#[test]
fn test_inconsistent_quotes_fail_cube() {
    let quotes = generate_quotes(BASIC);
    let scaled = |lattice: &SwaptionLattice, factor: f64| {
        let mut builder = SwaptionLattice::builder(lattice.meta().clone());
        for p in lattice.iter() {
            let value = if p.tenor == 60 { p.value * factor } else { p.value };
            builder.insert(p.maturity, p.tenor, p.moneyness, value).unwrap();
        }
        builder.build()
    };
    let distorted = Quotes {
        cash_payer: scaled(&quotes.cash_payer, 3.0),
        cash_receiver: scaled(&quotes.cash_receiver, 0.2),
        physical: quotes.physical.clone(),
    };

    let result = calibrator(&distorted, BASIC).calibrate("EUR", &TENORS);
    match result {
        Err(OptimiserError::SolverFailure { tenor, .. }) => assert_eq!(tenor, 60),
        other => panic!("expected tenor 60 to fail, got {other:?}"),
    }
}

/// A mismatched valuation date is rejected before any fit.
#[test]
fn test_reference_date_mismatch() {
    let quotes = generate_quotes(BASIC);
    let calibrator = SabrCubeCalibrator::new(
        Date::from_ymd(2017, 9, 1).unwrap(),
        quotes.cash_payer,
        quotes.cash_receiver,
        quotes.physical,
        curves(),
        BASIC,
        SabrStructure::default(),
    );
    assert!(matches!(
        calibrator.calibrate("EUR", &TENORS),
        Err(OptimiserError::InvalidConfig(_))
    ));
}

/// Too few replication points are rejected.
#[test]
fn test_invalid_replication_grid() {
    let quotes = generate_quotes(BASIC);
    let result = calibrator(&quotes, BASIC)
        .set_replication_parameters(true, -0.1, 0.1, 1)
        .calibrate("EUR", &TENORS);
    assert!(matches!(result, Err(OptimiserError::Swaption(_))));
}

// ============================================================================
// Configuration
// ============================================================================

proptest! {
    #[test]
    fn prop_positive_settings_validate(
        threads in 1usize..64,
        iterations in 1usize..1000,
        points in 2usize..2000,
    ) {
        let config = CubeCalibrationConfig::default()
            .with_threads(threads)
            .with_max_iterations(iterations)
            .with_replication(ReplicationSettings {
                points,
                ..ReplicationSettings::default()
            });
        prop_assert!(config.validate().is_ok());
    }
}
