//! Simulation configuration
//!
//! The main configuration type is `SimulationConfig`, which contains
//! everything needed to project one portfolio: the horizon, the tax rules,
//! the return assumption, contribution plans and the optional withdrawal
//! phase or explicit phase segments.
//!
//! Configurations are validated as a whole before any year is simulated.
//! The simulation loop never discovers a configuration problem mid-run.

use rand::Rng;
use rand_distr::Distribution;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::model::life_table::LifeTableSource;

/// Compounding granularity for a simulated year.
///
/// `Monthly` spreads contributions and withdrawals evenly over twelve
/// compounding steps; `Yearly` applies them once at the start of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Granularity {
    #[default]
    Yearly,
    Monthly,
}

/// Return assumption for a phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReturnMode {
    /// Same rate every year
    Fixed(f64),
    /// One draw from a Normal distribution per simulated year
    Random { mean: f64, std_dev: f64 },
    /// Explicit per-year rates; every simulated year must be present
    Variable(FxHashMap<i32, f64>),
    /// Weighted blend of asset-class return assumptions
    MultiAsset(Vec<AssetClassMix>),
}

/// One asset class in a `ReturnMode::MultiAsset` blend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssetClassMix {
    /// Portfolio weight, all weights must sum to 1
    pub weight: f64,
    /// Expected annual return of the asset class
    pub expected_return: f64,
}

/// Tolerance for multi-asset weight normalization
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

impl ReturnMode {
    /// Validate distribution parameters and per-year coverage for the
    /// given horizon. Called from `SimulationConfig::validate`.
    pub fn validate(&self, start_year: i32, end_year: i32) -> Result<()> {
        match self {
            ReturnMode::Fixed(rate) => {
                if !rate.is_finite() {
                    return Err(ConfigError::InvalidRate {
                        field: "fixed return rate",
                        value: *rate,
                    });
                }
            }
            ReturnMode::Random { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || *std_dev < 0.0 {
                    return Err(ConfigError::InvalidDistribution {
                        mean: *mean,
                        std_dev: *std_dev,
                        reason: "std_dev must be non-negative and finite",
                    });
                }
            }
            ReturnMode::Variable(rates) => {
                for year in start_year..=end_year {
                    if !rates.contains_key(&year) {
                        return Err(ConfigError::MissingReturnForYear { year });
                    }
                }
            }
            ReturnMode::MultiAsset(mix) => {
                if mix.is_empty() {
                    return Err(ConfigError::EmptyAssetMix);
                }
                let weight_sum: f64 = mix.iter().map(|a| a.weight).sum();
                if (weight_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                    return Err(ConfigError::UnnormalizedAssetMix { weight_sum });
                }
            }
        }
        Ok(())
    }

    /// Draw the return rate for one simulated year.
    ///
    /// `Variable` lookups cannot fail here: coverage of the horizon is
    /// checked in `validate`.
    pub fn rate_for_year<R: Rng + ?Sized>(&self, year: i32, rng: &mut R) -> f64 {
        match self {
            ReturnMode::Fixed(rate) => *rate,
            ReturnMode::Random { mean, std_dev } => rand_distr::Normal::new(*mean, *std_dev)
                .map(|d| d.sample(rng))
                .unwrap_or(*mean),
            ReturnMode::Variable(rates) => rates.get(&year).copied().unwrap_or(0.0),
            ReturnMode::MultiAsset(mix) => {
                mix.iter().map(|a| a.weight * a.expected_return).sum()
            }
        }
    }

    /// Expected annual rate, used by withdrawal strategies that size
    /// against the long-run assumption rather than a single year's draw.
    #[must_use]
    pub fn expected_rate(&self) -> f64 {
        match self {
            ReturnMode::Fixed(rate) => *rate,
            ReturnMode::Random { mean, .. } => *mean,
            ReturnMode::Variable(rates) => {
                if rates.is_empty() {
                    0.0
                } else {
                    rates.values().sum::<f64>() / rates.len() as f64
                }
            }
            ReturnMode::MultiAsset(mix) => {
                mix.iter().map(|a| a.weight * a.expected_return).sum()
            }
        }
    }
}

fn default_tax_rate() -> f64 {
    // Abgeltungssteuer incl. Solidaritätszuschlag
    0.26375
}

fn default_vorab_base_rate() -> f64 {
    // Basiszins 2024 (BMF)
    0.0229
}

fn default_allowance() -> f64 {
    // Sparerpauschbetrag, single filer
    1_000.0
}

fn default_true() -> bool {
    true
}

/// German capital-gains tax rules for one phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRules {
    /// Flat capital-gains rate (Abgeltungssteuer)
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,

    /// Teilfreistellung: fraction of fund gains exempt from tax, in [0, 1]
    #[serde(default)]
    pub partial_exemption_quota: f64,

    /// Personal income-tax rate; when set, the lower of flat and personal
    /// tax applies (Günstigerprüfung)
    #[serde(default)]
    pub personal_tax_rate: Option<f64>,

    /// Basiszins used for the Vorabpauschale deemed-gain base
    #[serde(default = "default_vorab_base_rate")]
    pub vorab_base_rate: f64,

    /// Whether Vorabpauschale tax is deducted from capital in the savings
    /// phase, or only tracked as payable
    #[serde(default = "default_true")]
    pub tax_reduces_capital: bool,

    /// Per-year Freibetrag overrides
    #[serde(default)]
    pub allowances: FxHashMap<i32, f64>,

    /// Freibetrag for years without an override
    #[serde(default = "default_allowance")]
    pub default_allowance: f64,
}

impl Default for TaxRules {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            partial_exemption_quota: 0.0,
            personal_tax_rate: None,
            vorab_base_rate: default_vorab_base_rate(),
            tax_reduces_capital: true,
            allowances: FxHashMap::default(),
            default_allowance: default_allowance(),
        }
    }
}

impl TaxRules {
    /// Freibetrag available at the start of a year. Unused allowance does
    /// not roll over between years.
    #[must_use]
    pub fn allowance_for_year(&self, year: i32) -> f64 {
        self.allowances
            .get(&year)
            .copied()
            .unwrap_or(self.default_allowance)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.partial_exemption_quota) {
            return Err(ConfigError::QuotaOutOfRange {
                quota: self.partial_exemption_quota,
            });
        }
        for (field, value) in [
            ("tax rate", self.tax_rate),
            ("vorab base rate", self.vorab_base_rate),
            ("default allowance", self.default_allowance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRate { field, value });
            }
        }
        if let Some(personal) = self.personal_tax_rate
            && (!personal.is_finite() || personal < 0.0)
        {
            return Err(ConfigError::InvalidRate {
                field: "personal tax rate",
                value: personal,
            });
        }
        Ok(())
    }
}

/// A recurring contribution instruction.
///
/// Contributions are summed per year; a year matched by no plan simply
/// contributes zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContributionPlan {
    pub annual_amount: f64,
    pub start_year: i32,
    /// Inclusive; `None` means the plan runs to the end of its phase
    #[serde(default)]
    pub end_year: Option<i32>,
}

impl ContributionPlan {
    #[must_use]
    pub fn amount_for_year(&self, year: i32) -> f64 {
        let ended = self.end_year.is_some_and(|end| year > end);
        if year >= self.start_year && !ended {
            self.annual_amount
        } else {
            0.0
        }
    }
}

/// Sum of all contribution plans active in a year.
#[must_use]
pub fn contributions_for_year(plans: &[ContributionPlan], year: i32) -> f64 {
    plans.iter().map(|p| p.amount_for_year(year)).sum()
}

// ============================================================================
// Withdrawal strategies
// ============================================================================

/// Withdrawal sizing policy for a withdrawal phase.
///
/// A closed set: adding a strategy is a compile-time exhaustiveness change
/// in `withdrawal::compute_withdrawal`, not a runtime string match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy")]
pub enum WithdrawalStrategy {
    /// Classic percentage rule (4 % rule, 3 % rule, ...) sized against the
    /// capital at the start of the withdrawal phase
    FixedPercentage(FixedPercentageParams),
    /// Constant monthly amount, optionally inflation-indexed
    FixedAmount(FixedAmountParams),
    /// Prior-year withdrawal adjusted when the trailing return crosses a
    /// guardrail; at most one adjustment direction per year
    DynamicGuardrails(GuardrailParams),
    /// Cash cushion drained first, refilled from the growth portfolio
    Bucket(BucketParams),
    /// Portfolio divided by a remaining-life-expectancy divisor
    Rmd(RmdParams),
    /// Withdraw only the real return, preserving inflation-adjusted capital
    CapitalPreservation(CapitalPreservationParams),
    /// Iterative search for the withdrawal that best uses the Freibetrag
    TaxOptimized(TaxOptimizedParams),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FixedPercentageParams {
    /// Annual withdrawal rate applied to the phase's initial capital
    pub rate: f64,
    /// Grow the withdrawal with the configured inflation rate
    #[serde(default)]
    pub inflation_adjusted: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FixedAmountParams {
    pub monthly_amount: f64,
    #[serde(default)]
    pub inflation_indexed: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuardrailParams {
    /// First-year withdrawal rate against the phase's initial capital
    pub base_rate: f64,
    /// Trailing return above which the withdrawal is raised
    pub upper_threshold: f64,
    /// Trailing return below which the withdrawal is cut
    pub lower_threshold: f64,
    /// Relative raise when the upper guardrail is crossed
    pub increase: f64,
    /// Relative cut when the lower guardrail is crossed
    pub decrease: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BucketParams {
    /// Annual withdrawal rate against the combined (cash + growth) value
    pub base_rate: f64,
    /// Cash cushion at the start of the withdrawal phase
    pub initial_cash: f64,
    /// Refill the cushion once it falls below this amount
    pub refill_threshold: f64,
    /// Fraction of the growth portfolio moved into the cushion on refill
    pub refill_fraction: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RmdParams {
    /// Age in the first year of the withdrawal phase
    pub start_age: u8,
    #[serde(default)]
    pub table: LifeTableSource,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CapitalPreservationParams {
    /// Inflation assumption subtracted from the expected nominal return
    pub expected_inflation: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaxOptimizedParams {
    /// Fallback withdrawal rate when the search does not converge
    pub base_rate: f64,
    /// Target Freibetrag utilization in [0, 1]
    pub allowance_target: f64,
    /// Upper bound on tax paid / amount withdrawn
    pub max_effective_tax_rate: f64,
}

impl WithdrawalStrategy {
    pub fn validate(&self) -> Result<()> {
        match self {
            WithdrawalStrategy::FixedPercentage(p) => validate_rate("withdrawal rate", p.rate),
            WithdrawalStrategy::FixedAmount(p) => {
                validate_rate("monthly withdrawal amount", p.monthly_amount)
            }
            WithdrawalStrategy::DynamicGuardrails(p) => {
                validate_rate("guardrail base rate", p.base_rate)?;
                validate_rate("guardrail increase", p.increase)?;
                validate_rate("guardrail decrease", p.decrease)
            }
            WithdrawalStrategy::Bucket(p) => {
                validate_rate("bucket base rate", p.base_rate)?;
                validate_rate("bucket initial cash", p.initial_cash)?;
                validate_rate("bucket refill threshold", p.refill_threshold)?;
                validate_rate("bucket refill fraction", p.refill_fraction)
            }
            WithdrawalStrategy::Rmd(p) => match p.table {
                LifeTableSource::Custom(divisor) if !(divisor >= 1.0) => {
                    Err(ConfigError::InvalidLifeExpectancyDivisor { divisor })
                }
                _ => Ok(()),
            },
            WithdrawalStrategy::CapitalPreservation(p) => {
                if p.expected_inflation.is_finite() {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidRate {
                        field: "expected inflation",
                        value: p.expected_inflation,
                    })
                }
            }
            WithdrawalStrategy::TaxOptimized(p) => {
                validate_rate("tax-optimized base rate", p.base_rate)?;
                validate_rate("allowance target", p.allowance_target)?;
                validate_rate("max effective tax rate", p.max_effective_tax_rate)
            }
        }
    }
}

fn validate_rate(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { field, value })
    }
}

// ============================================================================
// Phases
// ============================================================================

/// One contiguous sub-range of the simulation horizon with its own
/// strategy, return and tax assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub start_year: i32,
    /// Inclusive
    pub end_year: i32,
    pub kind: PhaseKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "phase")]
pub enum PhaseKind {
    Savings(SavingsPhase),
    Withdrawal(WithdrawalPhase),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsPhase {
    pub return_mode: ReturnMode,
    #[serde(default)]
    pub contributions: Vec<ContributionPlan>,
    /// Overrides the configuration-level tax rules for this segment
    #[serde(default)]
    pub tax: Option<TaxRules>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalPhase {
    pub strategy: WithdrawalStrategy,
    pub return_mode: ReturnMode,
    /// Inflation assumption for indexed strategies in this segment
    #[serde(default)]
    pub inflation_rate: f64,
    #[serde(default)]
    pub tax: Option<TaxRules>,
}

/// Two-phase convenience setup: savings until `start_year - 1`, then this
/// withdrawal strategy to the end of the horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalConfig {
    pub start_year: i32,
    pub strategy: WithdrawalStrategy,
}

// ============================================================================
// Simulation configuration
// ============================================================================

/// Complete configuration for projecting one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// First simulated year
    pub start_year: i32,
    /// Last simulated year, inclusive
    pub end_year: i32,

    #[serde(default)]
    pub initial_capital: f64,

    #[serde(default)]
    pub granularity: Granularity,

    pub return_mode: ReturnMode,

    #[serde(default)]
    pub tax: TaxRules,

    #[serde(default)]
    pub contributions: Vec<ContributionPlan>,

    /// Simple two-phase setup; ignored when `segments` is present
    #[serde(default)]
    pub withdrawal: Option<WithdrawalConfig>,

    /// Explicit phase segments partitioning the horizon
    #[serde(default)]
    pub segments: Option<Vec<Phase>>,

    /// Annual inflation assumption for real-value reporting and indexed
    /// withdrawal strategies
    #[serde(default)]
    pub inflation_rate: f64,
}

impl SimulationConfig {
    /// Number of simulated years in the full horizon.
    #[must_use]
    pub fn horizon_years(&self) -> usize {
        (self.end_year - self.start_year + 1).max(0) as usize
    }

    /// Validate the configuration as a whole. Fails fast: a configuration
    /// that passes cannot produce an error mid-simulation.
    pub fn validate(&self) -> Result<()> {
        if self.end_year < self.start_year {
            return Err(ConfigError::EmptyHorizon {
                start_year: self.start_year,
                end_year: self.end_year,
            });
        }
        self.tax.validate()?;

        let phases = self.resolved_phases()?;
        let mut expected = self.start_year;
        for (i, phase) in phases.iter().enumerate() {
            if phase.end_year < phase.start_year {
                return Err(ConfigError::EmptySegment {
                    start_year: phase.start_year,
                    end_year: phase.end_year,
                });
            }
            if phase.start_year != expected {
                return Err(if phase.start_year > expected {
                    ConfigError::SegmentGap {
                        expected,
                        found: phase.start_year,
                    }
                } else {
                    ConfigError::SegmentOverlap {
                        expected,
                        found: phase.start_year,
                    }
                });
            }
            match &phase.kind {
                PhaseKind::Savings(s) => {
                    s.return_mode.validate(phase.start_year, phase.end_year)?;
                    if let Some(tax) = &s.tax {
                        tax.validate()?;
                    }
                }
                PhaseKind::Withdrawal(w) => {
                    w.return_mode.validate(phase.start_year, phase.end_year)?;
                    w.strategy.validate()?;
                    if let Some(tax) = &w.tax {
                        tax.validate()?;
                    }
                }
            }
            if i == phases.len() - 1 && phase.end_year != self.end_year {
                return Err(ConfigError::SegmentOutOfRange {
                    start_year: self.start_year,
                    end_year: self.end_year,
                });
            }
            expected = phase.end_year + 1;
        }
        Ok(())
    }

    /// Resolve the phase list: explicit segments when present, otherwise
    /// synthesized from the contribution horizon and the optional
    /// withdrawal configuration.
    pub fn resolved_phases(&self) -> Result<Vec<Phase>> {
        if let Some(segments) = &self.segments {
            if segments.is_empty() {
                return Err(ConfigError::NoSegments);
            }
            if segments[0].start_year != self.start_year {
                return Err(ConfigError::SegmentOutOfRange {
                    start_year: self.start_year,
                    end_year: self.end_year,
                });
            }
            return Ok(segments.clone());
        }

        let savings = |start: i32, end: i32| Phase {
            start_year: start,
            end_year: end,
            kind: PhaseKind::Savings(SavingsPhase {
                return_mode: self.return_mode.clone(),
                contributions: self.contributions.clone(),
                tax: None,
            }),
        };

        match &self.withdrawal {
            None => Ok(vec![savings(self.start_year, self.end_year)]),
            Some(w) => {
                if w.start_year < self.start_year || w.start_year > self.end_year {
                    return Err(ConfigError::WithdrawalStartOutOfRange { year: w.start_year });
                }
                let withdrawal_phase = Phase {
                    start_year: w.start_year,
                    end_year: self.end_year,
                    kind: PhaseKind::Withdrawal(WithdrawalPhase {
                        strategy: w.strategy.clone(),
                        return_mode: self.return_mode.clone(),
                        inflation_rate: self.inflation_rate,
                        tax: None,
                    }),
                };
                if w.start_year == self.start_year {
                    Ok(vec![withdrawal_phase])
                } else {
                    Ok(vec![
                        savings(self.start_year, w.start_year - 1),
                        withdrawal_phase,
                    ])
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_contributions_missing_year_is_zero() {
        let plans = vec![ContributionPlan {
            annual_amount: 12_000.0,
            start_year: 2025,
            end_year: Some(2030),
        }];
        assert_eq!(contributions_for_year(&plans, 2024), 0.0);
        assert_eq!(contributions_for_year(&plans, 2025), 12_000.0);
        assert_eq!(contributions_for_year(&plans, 2030), 12_000.0);
        assert_eq!(contributions_for_year(&plans, 2031), 0.0);
    }

    #[test]
    fn test_contribution_plans_are_summed() {
        let plans = vec![
            ContributionPlan {
                annual_amount: 12_000.0,
                start_year: 2024,
                end_year: None,
            },
            ContributionPlan {
                annual_amount: 6_000.0,
                start_year: 2026,
                end_year: None,
            },
        ];
        assert_eq!(contributions_for_year(&plans, 2025), 12_000.0);
        assert_eq!(contributions_for_year(&plans, 2026), 18_000.0);
    }

    #[test]
    fn test_quota_out_of_range_rejected() {
        let rules = TaxRules {
            partial_exemption_quota: 1.3,
            ..TaxRules::default()
        };
        assert_eq!(
            rules.validate(),
            Err(ConfigError::QuotaOutOfRange { quota: 1.3 })
        );
    }

    #[test]
    fn test_allowance_override_and_default() {
        let mut rules = TaxRules::default();
        rules.allowances.insert(2026, 2_000.0);
        assert_eq!(rules.allowance_for_year(2025), 1_000.0);
        assert_eq!(rules.allowance_for_year(2026), 2_000.0);
    }

    #[test]
    fn test_variable_mode_requires_full_coverage() {
        let mut rates = FxHashMap::default();
        rates.insert(2024, 0.05);
        rates.insert(2026, 0.05);
        let mode = ReturnMode::Variable(rates);
        assert_eq!(
            mode.validate(2024, 2026),
            Err(ConfigError::MissingReturnForYear { year: 2025 })
        );
    }

    #[test]
    fn test_multi_asset_weights_must_normalize() {
        let mode = ReturnMode::MultiAsset(vec![
            AssetClassMix {
                weight: 0.5,
                expected_return: 0.07,
            },
            AssetClassMix {
                weight: 0.3,
                expected_return: 0.02,
            },
        ]);
        assert!(matches!(
            mode.validate(2024, 2025),
            Err(ConfigError::UnnormalizedAssetMix { .. })
        ));
    }

    #[test]
    fn test_multi_asset_blend_rate() {
        let mode = ReturnMode::MultiAsset(vec![
            AssetClassMix {
                weight: 0.6,
                expected_return: 0.08,
            },
            AssetClassMix {
                weight: 0.4,
                expected_return: 0.02,
            },
        ]);
        let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
        let rate = mode.rate_for_year(2024, &mut rng);
        assert!((rate - 0.056).abs() < 1e-12);
    }
}
