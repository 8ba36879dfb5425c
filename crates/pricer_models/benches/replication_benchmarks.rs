//! Benchmarks for cash-settled swaption replication.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricer_core::market_data::{CurveEnum, CurveSet};
use pricer_core::types::time::{Date, DayCountConvention};
use pricer_models::schedules::{Frequency, SchedulePrototype};
use pricer_models::swaptions::{
    AnnuityMappingType, CashSettledSwaption, ReplicationSettings, SabrNode, SabrStructure,
    SabrVolatilityCube, SwaptionMarket, SwaptionTerms, SwaptionType, TenorSmile,
};

fn terms() -> SwaptionTerms {
    SwaptionTerms {
        reference_date: Date::from_ymd(2017, 8, 30).unwrap(),
        maturity_months: 60,
        tenor_months: 120,
        fixed_leg: SchedulePrototype::new(Frequency::Annual, DayCountConvention::Thirty360),
        floating_leg: SchedulePrototype::new(
            Frequency::SemiAnnual,
            DayCountConvention::ActualActual360,
        ),
        discount_curve: "discount".into(),
        forward_curve: "forward".into(),
    }
}

fn market() -> SwaptionMarket {
    let node = SabrNode {
        base_vol: 0.015,
        vol_vol: 0.3,
        rho: -0.2,
    };
    let smile = TenorSmile::new(120, [(12, node), (120, node)]).unwrap();
    let cube = SabrVolatilityCube::new(
        "EUR",
        Date::from_ymd(2017, 8, 30).unwrap(),
        SabrStructure::default(),
        [smile],
    );
    SwaptionMarket::new(
        CurveSet::new()
            .with_curve("discount", CurveEnum::flat(0.01))
            .with_curve("forward", CurveEnum::flat(0.015)),
    )
    .with_volatility_cube(cube)
}

fn benchmark_mappings(c: &mut Criterion) {
    let market = market();
    let mut group = c.benchmark_group("cash_payer_by_mapping");

    for mapping in [
        AnnuityMappingType::BasicPiterbarg,
        AnnuityMappingType::SimplifiedLinear,
        AnnuityMappingType::MultiPiterbarg,
    ] {
        let swaption = CashSettledSwaption::new(SwaptionType::Payer, 0.02, terms(), "EUR", mapping);
        group.bench_with_input(
            BenchmarkId::from_parameter(mapping),
            &swaption,
            |b, s| b.iter(|| s.value(black_box(&market))),
        );
    }

    group.finish();
}

fn benchmark_grid_points(c: &mut Criterion) {
    let market = market();
    let mut group = c.benchmark_group("cash_payer_by_points");

    for points in [51, 201, 401, 801] {
        let swaption = CashSettledSwaption::new(
            SwaptionType::Payer,
            0.02,
            terms(),
            "EUR",
            AnnuityMappingType::BasicPiterbarg,
        )
        .with_replication(ReplicationSettings {
            points,
            ..ReplicationSettings::default()
        });
        group.bench_with_input(BenchmarkId::from_parameter(points), &swaption, |b, s| {
            b.iter(|| s.value(black_box(&market)))
        });
    }

    group.finish();
}

fn benchmark_grid_reuse(c: &mut Criterion) {
    let market = market();
    let swaption = CashSettledSwaption::new(
        SwaptionType::Receiver,
        0.01,
        terms(),
        "EUR",
        AnnuityMappingType::MultiPiterbarg,
    );
    let swap = terms().forward_swap(&market).unwrap();
    let grid = swaption
        .replication_grid(&swap, &SabrStructure::default())
        .unwrap();

    c.bench_function("replication_grid_evaluate", |b| {
        b.iter(|| grid.evaluate(|_| Ok(black_box(0.006))))
    });
}

criterion_group!(
    benches,
    benchmark_mappings,
    benchmark_grid_points,
    benchmark_grid_reuse
);
criterion_main!(benches);
