//! Financial projection engine for German retirement planning
//!
//! This crate is the pure computational core of a savings/withdrawal
//! planner. It supports:
//! - Year-by-year capital projection with yearly or monthly compounding
//! - German tax approximations: Teilfreistellung, Freibetrag,
//!   Vorabpauschale and Günstigerprüfung
//! - Seven withdrawal strategies, from the classic percentage rules to
//!   guardrails, buckets, RMD-style sizing and tax-optimized search
//! - Segmented multi-phase plans with per-segment return, tax and
//!   inflation assumptions
//! - Multi-scenario comparison with cross-scenario statistics
//!
//! The engine is deterministic and side-effect free: callers supply a
//! validated configuration and a seed, and receive immutable per-year
//! records plus derived summary metrics.
//!
//! ```ignore
//! use vorsorge_core::model::{ContributionPlan, ReturnMode, SimulationConfig, TaxRules};
//! use vorsorge_core::simulation::simulate;
//!
//! let config = SimulationConfig {
//!     start_year: 2024,
//!     end_year: 2054,
//!     initial_capital: 50_000.0,
//!     granularity: Default::default(),
//!     return_mode: ReturnMode::Fixed(0.05),
//!     tax: TaxRules::default(),
//!     contributions: vec![ContributionPlan {
//!         annual_amount: 12_000.0,
//!         start_year: 2024,
//!         end_year: None,
//!     }],
//!     withdrawal: None,
//!     segments: None,
//!     inflation_rate: 0.02,
//! };
//! let result = simulate(&config, 42)?;
//! println!("end capital: {:.2}", result.end_capital());
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod accumulation;
pub mod comparison;
pub mod error;
pub mod simulation;
pub mod statistics;
pub mod taxes;
pub mod withdrawal;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use comparison::{run_comparison, run_scenario};
pub use error::ConfigError;
pub use simulation::simulate;
