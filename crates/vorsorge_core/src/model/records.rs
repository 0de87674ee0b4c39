//! Per-year simulation records and the state threaded between year steps
//!
//! One `YearRecord` is produced per simulated year and is immutable once
//! emitted. `YearState` is the value threaded from step to step; year steps
//! consume a state and return a new one instead of mutating in place.

use serde::{Deserialize, Serialize};

/// Immutable output of one simulated year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub year: i32,
    pub starting_capital: f64,
    /// Contributions added during the year (savings phases)
    pub contributions: f64,
    /// Amount withdrawn during the year (withdrawal phases)
    pub withdrawal: f64,
    /// Market gain or loss for the year
    pub return_amount: f64,
    /// Total tax paid in the year (Vorabpauschale + realized gains)
    pub tax_paid: f64,
    /// Freibetrag consumed in the year
    pub allowance_used: f64,
    /// Vorabpauschale deemed-gain base taxed this year
    pub vorab_base: f64,
    /// Running total of taxed Vorabpauschale bases carried forward
    pub vorab_accumulated: f64,
    pub ending_capital: f64,
}

/// Strategy sub-state for withdrawal phases.
///
/// Kept separate from `YearState` so the withdrawal resolver can stay a
/// pure function: it receives the current sub-state and returns the next.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WithdrawalState {
    /// Prior year's withdrawal, used by the guardrail strategy
    pub previous_withdrawal: Option<f64>,
    /// Cash cushion balance, used by the bucket strategy
    pub cash_bucket: f64,
}

/// Portfolio state at a year boundary, threaded through the simulation
/// fold. Besides capital this carries exactly the two pieces of cross-year
/// tax state the model allows: the cost basis and the accumulated
/// Vorabpauschale credit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearState {
    pub year: i32,
    pub capital: f64,
    /// Contributed principal still in the portfolio; the remainder of
    /// `capital` is unrealized gain
    pub cost_basis: f64,
    /// Taxed Vorabpauschale bases, credited against realized gains
    pub vorab_accumulated: f64,
    /// Last year's return rate, used by the guardrail strategy
    pub trailing_return: f64,
    pub withdrawal: WithdrawalState,
}

impl YearState {
    /// Initial state at the start of the horizon. Starting capital is
    /// treated as already-taxed principal.
    #[must_use]
    pub fn initial(start_year: i32, initial_capital: f64) -> Self {
        Self {
            year: start_year,
            capital: initial_capital,
            cost_basis: initial_capital,
            vorab_accumulated: 0.0,
            trailing_return: 0.0,
            withdrawal: WithdrawalState::default(),
        }
    }

    /// Unrealized gain fraction of the current capital, in [0, 1].
    /// Zero for an empty portfolio.
    #[must_use]
    pub fn gain_fraction(&self) -> f64 {
        if self.capital <= 0.0 {
            return 0.0;
        }
        ((self.capital - self.cost_basis) / self.capital).clamp(0.0, 1.0)
    }
}
