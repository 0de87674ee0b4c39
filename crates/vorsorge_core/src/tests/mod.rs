//! Integration tests for the vorsorge projection engine
//!
//! Tests are organized by topic:
//! - `accumulation` - Savings-phase compounding, contributions, Vorabpauschale
//! - `withdrawal` - Withdrawal strategies, clamping and exhaustion
//! - `segments` - Phase validation and multi-phase plans
//! - `comparison` - Scenario fan-out and cross-scenario statistics

mod comparison;

use crate::model::{ReturnMode, SimulationConfig, TaxRules};

/// Savings-only configuration with sensible defaults for tests.
pub(crate) fn base_config(start_year: i32, end_year: i32, rate: f64) -> SimulationConfig {
    SimulationConfig {
        start_year,
        end_year,
        initial_capital: 0.0,
        granularity: Default::default(),
        return_mode: ReturnMode::Fixed(rate),
        tax: no_tax(),
        contributions: Vec::new(),
        withdrawal: None,
        segments: None,
        inflation_rate: 0.0,
    }
}

/// Tax rules that collect nothing, for tests exercising pure compounding.
pub(crate) fn no_tax() -> TaxRules {
    TaxRules {
        tax_rate: 0.0,
        vorab_base_rate: 0.0,
        default_allowance: 0.0,
        ..TaxRules::default()
    }
}
