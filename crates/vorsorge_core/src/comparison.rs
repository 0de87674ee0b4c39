//! Scenario comparison engine
//!
//! Runs N independent scenarios and derives cross-scenario statistics.
//! Scenarios share no mutable state; each run gets its own seeded RNG, so
//! sequential and parallel execution produce identical results. The
//! `parallel` feature fans scenarios out over rayon.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

#[cfg(feature = "parallel")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::Result;
use crate::model::{
    Comparison, ComparisonStatistics, Scenario, ScenarioMetrics, ScenarioResult,
};
use crate::simulation::simulate;
use crate::statistics;

/// Run a single scenario with an explicit seed.
pub fn run_scenario(scenario: &Scenario, seed: u64) -> Result<ScenarioResult> {
    let result = simulate(&scenario.config, seed)?;
    let metrics = ScenarioMetrics::from_result(&result, scenario.config.inflation_rate);
    Ok(ScenarioResult {
        scenario_id: scenario.scenario_id,
        result,
        metrics,
    })
}

/// Run every scenario independently and compute cross-scenario statistics.
///
/// Per-scenario seeds are derived from the run seed in input order, so a
/// comparison is reproducible end to end from one seed regardless of
/// execution order. Statistics are `None` for fewer than two results.
pub fn run_comparison(
    scenarios: &[Scenario],
    seed: u64,
) -> Result<(Vec<ScenarioResult>, Option<ComparisonStatistics>)> {
    let mut seed_rng = SmallRng::seed_from_u64(seed);
    let seeds: Vec<u64> = scenarios.iter().map(|_| seed_rng.next_u64()).collect();

    #[cfg(feature = "parallel")]
    let results: Result<Vec<ScenarioResult>> = scenarios
        .iter()
        .zip(seeds)
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(scenario, scenario_seed)| run_scenario(scenario, scenario_seed))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Result<Vec<ScenarioResult>> = scenarios
        .iter()
        .zip(seeds)
        .map(|(scenario, scenario_seed)| run_scenario(scenario, scenario_seed))
        .collect();

    let results = results?;
    let stats = compute_statistics(&results);
    Ok((results, stats))
}

/// Cross-scenario statistics over nominal end capitals.
///
/// Defined only for two or more results. Best/worst ties go to the
/// scenario encountered first in input order; percentiles use the lower
/// method; the standard deviation is the population standard deviation.
#[must_use]
pub fn compute_statistics(results: &[ScenarioResult]) -> Option<ComparisonStatistics> {
    if results.len() < 2 {
        return None;
    }

    let mut best = &results[0];
    let mut worst = &results[0];
    for result in &results[1..] {
        if result.metrics.end_capital_nominal > best.metrics.end_capital_nominal {
            best = result;
        }
        if result.metrics.end_capital_nominal < worst.metrics.end_capital_nominal {
            worst = result;
        }
    }

    let mut end_capitals: Vec<f64> = results
        .iter()
        .map(|r| r.metrics.end_capital_nominal)
        .collect();
    end_capitals.sort_by(f64::total_cmp);

    Some(ComparisonStatistics {
        best: best.scenario_id,
        worst: worst.scenario_id,
        mean: statistics::mean(&end_capitals)?,
        std_dev: statistics::population_std_dev(&end_capitals)?,
        p25: statistics::percentile_lower(&end_capitals, 0.25)?,
        p50: statistics::percentile_lower(&end_capitals, 0.50)?,
        p75: statistics::percentile_lower(&end_capitals, 0.75)?,
        range: best.metrics.end_capital_nominal - worst.metrics.end_capital_nominal,
    })
}

impl Comparison {
    /// Re-run every scenario and rebuild results and statistics from
    /// scratch. Prior derived state is discarded wholesale, never patched.
    pub fn recompute(&mut self, seed: u64, now: jiff::Timestamp) -> Result<()> {
        self.invalidate();
        let (results, statistics) = run_comparison(&self.scenarios, seed)?;
        self.results = Some(results);
        self.statistics = statistics;
        self.updated_at = now;
        Ok(())
    }
}
