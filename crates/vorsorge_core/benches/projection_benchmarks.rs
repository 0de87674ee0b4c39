//! Criterion benchmarks for vorsorge_core
//!
//! Run with: cargo bench -p vorsorge_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use vorsorge_core::comparison::run_comparison;
use vorsorge_core::model::{
    ContributionPlan, FixedPercentageParams, ReturnMode, Scenario, ScenarioId, SimulationConfig,
    TaxRules, WithdrawalConfig, WithdrawalStrategy,
};
use vorsorge_core::simulation::simulate;

fn lifecycle_config(horizon_years: i32) -> SimulationConfig {
    let start_year = 2024;
    let end_year = start_year + horizon_years - 1;
    SimulationConfig {
        start_year,
        end_year,
        initial_capital: 50_000.0,
        granularity: Default::default(),
        return_mode: ReturnMode::Fixed(0.06),
        tax: TaxRules::default(),
        contributions: vec![ContributionPlan {
            annual_amount: 18_000.0,
            start_year,
            end_year: None,
        }],
        withdrawal: Some(WithdrawalConfig {
            start_year: start_year + horizon_years * 2 / 3,
            strategy: WithdrawalStrategy::FixedPercentage(FixedPercentageParams {
                rate: 0.04,
                inflation_adjusted: true,
            }),
        }),
        segments: None,
        inflation_rate: 0.02,
    }
}

fn bench_simulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    for years in [30, 60] {
        let config = lifecycle_config(years);
        group.bench_with_input(BenchmarkId::from_parameter(years), &config, |b, config| {
            b.iter(|| simulate(black_box(config), 42).unwrap());
        });
    }
    group.finish();
}

fn bench_comparison(c: &mut Criterion) {
    let scenarios: Vec<Scenario> = (0..8)
        .map(|i| {
            let mut config = lifecycle_config(45);
            config.return_mode = ReturnMode::Random {
                mean: 0.04 + 0.005 * f64::from(i),
                std_dev: 0.12,
            };
            Scenario {
                scenario_id: ScenarioId(i as u32),
                name: format!("scenario {i}"),
                color: None,
                config,
            }
        })
        .collect();

    c.bench_function("run_comparison/8", |b| {
        b.iter(|| run_comparison(black_box(&scenarios), 42).unwrap());
    });
}

criterion_group!(benches, bench_simulate, bench_comparison);
criterion_main!(benches);
