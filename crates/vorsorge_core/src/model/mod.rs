mod config;
mod life_table;
mod records;
mod results;
mod scenario;

pub use config::{
    AssetClassMix, BucketParams, CapitalPreservationParams, ContributionPlan,
    FixedAmountParams, FixedPercentageParams, Granularity, GuardrailParams, Phase, PhaseKind,
    ReturnMode, RmdParams, SavingsPhase, SimulationConfig, TaxOptimizedParams, TaxRules,
    WithdrawalConfig, WithdrawalPhase, WithdrawalStrategy, contributions_for_year,
};
pub use life_table::{
    LifeExpectancyTable, LifeTableEntry, LifeTableSource, MIN_DIVISOR,
};
pub use records::{WithdrawalState, YearRecord, YearState};
pub use results::{ScenarioMetrics, SimulationResult};
pub use scenario::{Comparison, ComparisonStatistics, Scenario, ScenarioId, ScenarioResult};
