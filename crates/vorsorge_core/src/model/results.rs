//! Simulation results and per-scenario summary metrics

use serde::{Deserialize, Serialize};

use crate::model::records::YearRecord;
use crate::statistics;

/// Complete result of projecting one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One record per simulated year, in order
    pub records: Vec<YearRecord>,
    /// Whether the portfolio ran dry before the end of the horizon
    pub exhausted: bool,
    /// Years actually simulated; less than the configured horizon when the
    /// portfolio was exhausted early
    pub duration_years: usize,
}

impl SimulationResult {
    /// Capital at the end of the last simulated year.
    #[must_use]
    pub fn end_capital(&self) -> f64 {
        self.records.last().map_or(0.0, |r| r.ending_capital)
    }

    #[must_use]
    pub fn total_contributions(&self) -> f64 {
        self.records.iter().map(|r| r.contributions).sum()
    }

    #[must_use]
    pub fn total_withdrawals(&self) -> f64 {
        self.records.iter().map(|r| r.withdrawal).sum()
    }

    #[must_use]
    pub fn total_returns(&self) -> f64 {
        self.records.iter().map(|r| r.return_amount).sum()
    }

    #[must_use]
    pub fn total_taxes(&self) -> f64 {
        self.records.iter().map(|r| r.tax_paid).sum()
    }

    #[must_use]
    pub fn total_allowance_used(&self) -> f64 {
        self.records.iter().map(|r| r.allowance_used).sum()
    }

    /// Record for a specific year, if it was simulated.
    #[must_use]
    pub fn record_for_year(&self, year: i32) -> Option<&YearRecord> {
        self.records.iter().find(|r| r.year == year)
    }
}

/// Summary metrics of one scenario run, derived from its records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    pub end_capital_nominal: f64,
    /// End capital deflated by the configured inflation assumption
    pub end_capital_real: f64,
    pub total_contributions: f64,
    pub total_returns: f64,
    pub total_taxes: f64,
    /// Geometric mean of the yearly growth rates on exposed capital;
    /// `None` when no year had capital at risk
    pub annualized_return: Option<f64>,
    pub duration_years: usize,
}

impl ScenarioMetrics {
    /// Derive summary metrics from a finished run.
    #[must_use]
    pub fn from_result(result: &SimulationResult, inflation_rate: f64) -> Self {
        let end_capital_nominal = result.end_capital();
        let end_capital_real = statistics::real_value(
            end_capital_nominal,
            inflation_rate,
            result.duration_years,
        );

        // Growth factor per year on the capital actually exposed to the
        // market: start + contributions - withdrawal.
        let factors: Vec<f64> = result
            .records
            .iter()
            .filter_map(|r| {
                let base = r.starting_capital + r.contributions - r.withdrawal;
                if base > 0.0 {
                    Some(1.0 + r.return_amount / base)
                } else {
                    None
                }
            })
            .collect();
        let annualized_return = statistics::geometric_mean_rate(&factors);

        Self {
            end_capital_nominal,
            end_capital_real,
            total_contributions: result.total_contributions(),
            total_returns: result.total_returns(),
            total_taxes: result.total_taxes(),
            annualized_return,
            duration_years: result.duration_years,
        }
    }
}
