//! Tests for scenario comparison and cross-scenario statistics
//!
//! These tests verify that:
//! - Scenarios run independently and reproducibly
//! - Statistics exist only for two or more results
//! - Percentiles, range and best/worst respect their documented ordering
//! - Recomputation rebuilds derived state wholesale

use crate::comparison::{compute_statistics, run_comparison};
use crate::model::{
    Comparison, ContributionPlan, ReturnMode, Scenario, ScenarioId,
};
use crate::statistics::calculate_deviation;
use crate::tests::base_config;

fn scenario(id: u32, name: &str, rate: f64) -> Scenario {
    let mut config = base_config(2024, 2030, rate);
    config.contributions = vec![ContributionPlan {
        annual_amount: 24_000.0,
        start_year: 2024,
        end_year: None,
    }];
    Scenario {
        scenario_id: ScenarioId(id),
        name: name.into(),
        color: None,
        config,
    }
}

#[test]
fn test_higher_return_scenario_wins() {
    let scenarios = vec![scenario(1, "5% return", 0.05), scenario(2, "7% return", 0.07)];
    let (results, stats) = run_comparison(&scenarios, 0).unwrap();

    let end_05 = results[0].metrics.end_capital_nominal;
    let end_07 = results[1].metrics.end_capital_nominal;
    assert!(end_07 > end_05);

    let deviation = calculate_deviation(end_07, end_05).unwrap();
    assert!(deviation > 0.0, "deviation {deviation} not strictly positive");

    let stats = stats.unwrap();
    assert_eq!(stats.best, ScenarioId(2));
    assert_eq!(stats.worst, ScenarioId(1));
}

#[test]
fn test_statistics_ordering() {
    let scenarios = vec![
        scenario(1, "defensive", 0.02),
        scenario(2, "balanced", 0.04),
        scenario(3, "growth", 0.06),
        scenario(4, "aggressive", 0.08),
    ];
    let (results, stats) = run_comparison(&scenarios, 0).unwrap();
    let stats = stats.unwrap();

    let best_end = results
        .iter()
        .find(|r| r.scenario_id == stats.best)
        .unwrap()
        .metrics
        .end_capital_nominal;
    let worst_end = results
        .iter()
        .find(|r| r.scenario_id == stats.worst)
        .unwrap()
        .metrics
        .end_capital_nominal;

    assert!(worst_end <= stats.p25);
    assert!(stats.p25 <= stats.p50);
    assert!(stats.p50 <= stats.p75);
    assert!(stats.p75 <= best_end);
    assert!((stats.range - (best_end - worst_end)).abs() < 1e-9);
    assert!(stats.std_dev >= 0.0);
    assert!(stats.mean >= worst_end && stats.mean <= best_end);
}

#[test]
fn test_statistics_require_two_results() {
    let scenarios = vec![scenario(1, "only one", 0.05)];
    let (results, stats) = run_comparison(&scenarios, 0).unwrap();
    assert_eq!(results.len(), 1);
    assert!(stats.is_none());
    assert!(compute_statistics(&results).is_none());
}

#[test]
fn test_best_worst_tie_goes_to_first_in_input_order() {
    let scenarios = vec![scenario(7, "first", 0.05), scenario(8, "second", 0.05)];
    let (_, stats) = run_comparison(&scenarios, 0).unwrap();
    let stats = stats.unwrap();

    assert_eq!(stats.best, ScenarioId(7));
    assert_eq!(stats.worst, ScenarioId(7));
    assert_eq!(stats.range, 0.0);
}

#[test]
fn test_comparison_is_reproducible_with_random_returns() {
    let mut risky = scenario(1, "risky", 0.0);
    risky.config.return_mode = ReturnMode::Random {
        mean: 0.06,
        std_dev: 0.12,
    };
    let scenarios = vec![risky, scenario(2, "safe", 0.03)];

    let (first, _) = run_comparison(&scenarios, 99).unwrap();
    let (second, _) = run_comparison(&scenarios, 99).unwrap();
    assert_eq!(
        first[0].result.records, second[0].result.records,
        "same comparison seed must reproduce every scenario run"
    );
}

#[test]
fn test_recompute_rebuilds_derived_state() {
    let created = jiff::Timestamp::UNIX_EPOCH;
    let mut comparison = Comparison::new(
        1,
        "equity quotas",
        created,
        vec![scenario(1, "cautious", 0.03), scenario(2, "brave", 0.07)],
    );
    assert!(comparison.results.is_none());

    let now = jiff::Timestamp::from_second(1_720_000_000).unwrap();
    comparison.recompute(0, now).unwrap();

    let results = comparison.results.as_ref().unwrap();
    assert_eq!(results.len(), 2);
    assert!(comparison.statistics.is_some());
    assert_eq!(comparison.updated_at, now);
    assert_eq!(comparison.created_at, created);

    // A second recompute replaces rather than appends
    comparison.recompute(0, now).unwrap();
    assert_eq!(comparison.results.as_ref().unwrap().len(), 2);
}

#[test]
fn test_scenario_metrics_totals() {
    let scenarios = vec![scenario(1, "baseline", 0.05), scenario(2, "alt", 0.05)];
    let (results, _) = run_comparison(&scenarios, 0).unwrap();

    let metrics = &results[0].metrics;
    assert_eq!(metrics.duration_years, 7);
    assert!((metrics.total_contributions - 7.0 * 24_000.0).abs() < 1e-9);
    assert!(metrics.total_returns > 0.0);
    // Annualized return of a fixed 5% projection is 5%
    let annualized = metrics.annualized_return.unwrap();
    assert!((annualized - 0.05).abs() < 1e-9);
}
