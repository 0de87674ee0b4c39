//! Scenario and comparison aggregates
//!
//! A `Scenario` pairs a configuration with display metadata; a
//! `Comparison` groups scenarios with their (re)computed results and
//! cross-scenario statistics. Results and statistics are always rebuilt
//! wholesale, never patched incrementally.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::model::config::SimulationConfig;
use crate::model::results::{ScenarioMetrics, SimulationResult};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ScenarioId(pub u32);

/// One comparison unit: a configuration plus display metadata. The color
/// is cosmetic and opaque to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: ScenarioId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    pub config: SimulationConfig,
}

/// Result of running one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_id: ScenarioId,
    pub result: SimulationResult,
    pub metrics: ScenarioMetrics,
}

/// Cross-scenario statistics over nominal end capitals.
///
/// Only defined for two or more scenario results. Percentiles use the
/// lower method (`sorted[floor(p * (n - 1))]`); the standard deviation is
/// the population standard deviation; best/worst ties go to the scenario
/// encountered first in input order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonStatistics {
    pub best: ScenarioId,
    pub worst: ScenarioId,
    pub mean: f64,
    pub std_dev: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    /// best end capital minus worst end capital
    pub range: f64,
}

/// A named set of scenarios with optional derived results.
///
/// Timestamps are supplied by the caller; the engine never reads the
/// clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub comparison_id: u32,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub results: Option<Vec<ScenarioResult>>,
    #[serde(default)]
    pub statistics: Option<ComparisonStatistics>,
}

impl Comparison {
    /// Create a comparison with no derived results yet.
    #[must_use]
    pub fn new(
        comparison_id: u32,
        name: impl Into<String>,
        created_at: Timestamp,
        scenarios: Vec<Scenario>,
    ) -> Self {
        Self {
            comparison_id,
            name: name.into(),
            created_at,
            updated_at: created_at,
            scenarios,
            results: None,
            statistics: None,
        }
    }

    /// Drop all derived results, e.g. after a scenario was edited.
    pub fn invalidate(&mut self) {
        self.results = None;
        self.statistics = None;
    }
}
