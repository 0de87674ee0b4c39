//! Withdrawal strategy resolver and withdrawal-phase year step
//!
//! `compute_withdrawal` is a single exhaustive dispatch over the closed
//! strategy set. It is stateless: strategy sub-state (prior withdrawal,
//! cash bucket) is passed in and the successor state returned. Every
//! strategy clamps to the available capital and flags exhaustion when the
//! unclamped amount exceeds it; exhaustion is a terminal condition for the
//! driver, not an error.

use rand::Rng;

use crate::accumulation::grow_for_year;
use crate::model::{
    BucketParams, Granularity, TaxOptimizedParams, TaxRules, WithdrawalPhase, WithdrawalState,
    WithdrawalStrategy, YearRecord, YearState,
};
use crate::taxes;

/// Iteration bound for the tax-optimized search
const TAX_SEARCH_MAX_ITERATIONS: usize = 24;

/// Inputs to the resolver for one year.
#[derive(Debug, Clone, Copy)]
pub struct WithdrawalContext<'a> {
    pub year: i32,
    /// Years since the start of the withdrawal phase
    pub year_index: usize,
    pub current_capital: f64,
    /// Capital at the start of the withdrawal phase
    pub initial_capital: f64,
    /// Last year's return rate
    pub trailing_return: f64,
    /// Phase inflation assumption for indexed strategies
    pub inflation_rate: f64,
    /// Long-run expected return of the phase's return mode
    pub expected_return: f64,
    /// Unrealized gain fraction of the current capital
    pub gain_fraction: f64,
    /// Accumulated Vorabpauschale credit
    pub vorab_credit: f64,
    pub rules: &'a TaxRules,
    /// Freibetrag still available this year
    pub allowance_remaining: f64,
}

/// Resolver output: the clamped withdrawal, the exhaustion flag and the
/// successor strategy sub-state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithdrawalOutcome {
    pub amount: f64,
    pub exhausted: bool,
    pub state: WithdrawalState,
}

/// Compute the withdrawal for one year.
pub fn compute_withdrawal(
    strategy: &WithdrawalStrategy,
    ctx: &WithdrawalContext<'_>,
    state: WithdrawalState,
) -> WithdrawalOutcome {
    let available = ctx.current_capital.max(0.0);

    let (desired, cash_bucket) = match strategy {
        WithdrawalStrategy::FixedPercentage(p) => {
            let mut amount = ctx.initial_capital * p.rate;
            if p.inflation_adjusted {
                amount *= (1.0 + ctx.inflation_rate).powi(ctx.year_index as i32);
            }
            (amount, state.cash_bucket)
        }
        WithdrawalStrategy::FixedAmount(p) => {
            let mut amount = p.monthly_amount * 12.0;
            if p.inflation_indexed {
                amount *= (1.0 + ctx.inflation_rate).powi(ctx.year_index as i32);
            }
            (amount, state.cash_bucket)
        }
        WithdrawalStrategy::DynamicGuardrails(p) => {
            let amount = match state.previous_withdrawal {
                None => ctx.initial_capital * p.base_rate,
                // One adjustment direction at most per year
                Some(prev) if ctx.trailing_return > p.upper_threshold => prev * (1.0 + p.increase),
                Some(prev) if ctx.trailing_return < p.lower_threshold => prev * (1.0 - p.decrease),
                Some(prev) => prev,
            };
            (amount, state.cash_bucket)
        }
        WithdrawalStrategy::Bucket(p) => return bucket_withdrawal(p, ctx, state),
        WithdrawalStrategy::Rmd(p) => {
            let age = p.start_age.saturating_add(ctx.year_index.min(u8::MAX as usize) as u8);
            let divisor = p.table.divisor_for_age(age);
            (available / divisor, state.cash_bucket)
        }
        WithdrawalStrategy::CapitalPreservation(p) => {
            let real_rate = (ctx.expected_return - p.expected_inflation).max(0.0);
            (available * real_rate, state.cash_bucket)
        }
        WithdrawalStrategy::TaxOptimized(p) => (tax_optimized_amount(p, ctx), state.cash_bucket),
    };

    let exhausted = desired > available;
    let amount = desired.clamp(0.0, available);
    WithdrawalOutcome {
        amount,
        exhausted,
        state: WithdrawalState {
            previous_withdrawal: Some(amount),
            cash_bucket,
        },
    }
}

/// Bucket strategy: drain the cash cushion first, refill it from the
/// growth portfolio when it falls below the threshold. The base rate
/// applies to the combined value.
fn bucket_withdrawal(
    p: &BucketParams,
    ctx: &WithdrawalContext<'_>,
    state: WithdrawalState,
) -> WithdrawalOutcome {
    let total = ctx.current_capital.max(0.0);
    let cash = if ctx.year_index == 0 {
        p.initial_cash.min(total)
    } else {
        state.cash_bucket.min(total)
    };

    let desired = total * p.base_rate;
    let exhausted = desired > total;
    let amount = desired.clamp(0.0, total);

    let from_cash = amount.min(cash);
    let mut cash_after = cash - from_cash;
    let mut growth_after = (total - cash) - (amount - from_cash);

    if cash_after < p.refill_threshold {
        let refill = growth_after * p.refill_fraction;
        cash_after += refill;
        growth_after -= refill;
    }
    debug_assert!(growth_after >= -1e-9);

    WithdrawalOutcome {
        amount,
        exhausted,
        state: WithdrawalState {
            previous_withdrawal: Some(amount),
            cash_bucket: cash_after,
        },
    }
}

/// Taxable amount (after Vorabpauschale credit and partial exemption)
/// realized by a candidate withdrawal.
fn taxable_at(withdrawal: f64, ctx: &WithdrawalContext<'_>) -> f64 {
    let realized = withdrawal * ctx.gain_fraction;
    taxes::taxable_portion(
        (realized - ctx.vorab_credit).max(0.0),
        ctx.rules.partial_exemption_quota,
    )
}

/// Bisect for the withdrawal whose taxable realized gain meets the
/// allowance utilization target, honoring the effective-tax-rate band.
/// Falls back to the base rate on non-convergence.
fn tax_optimized_amount(p: &TaxOptimizedParams, ctx: &WithdrawalContext<'_>) -> f64 {
    let available = ctx.current_capital.max(0.0);
    let fallback = available * p.base_rate;
    let target = p.allowance_target * ctx.allowance_remaining;

    // The target is unreachable when the portfolio holds too little gain;
    // no amount of iteration helps.
    if taxable_at(available, ctx) < target {
        return fallback;
    }

    let tolerance = (target * 1e-3).max(0.01);
    let mut low = 0.0;
    let mut high = available;
    let mut converged = None;

    for _ in 0..TAX_SEARCH_MAX_ITERATIONS {
        let mid = f64::midpoint(low, high);
        let taxable = taxable_at(mid, ctx);
        if (taxable - target).abs() <= tolerance {
            converged = Some(mid);
            break;
        }
        if taxable < target {
            low = mid;
        } else {
            high = mid;
        }
    }

    match converged {
        Some(amount) if amount > 0.0 => {
            let tax = taxes::tax_on_realized_gain(
                amount,
                ctx.gain_fraction,
                ctx.vorab_credit,
                ctx.rules,
                ctx.allowance_remaining,
            )
            .tax;
            if tax / amount <= p.max_effective_tax_rate {
                amount
            } else {
                fallback
            }
        }
        _ => fallback,
    }
}

// ============================================================================
// Withdrawal-phase year step
// ============================================================================

/// Simulate one withdrawal-phase year: resolve the withdrawal, tax the
/// realized gains, grow the remainder, assess the Vorabpauschale.
///
/// Returns the successor state, the year's record and whether the
/// portfolio was exhausted (terminal for the driver).
pub fn withdrawal_year<R: Rng + ?Sized>(
    state: YearState,
    phase: &WithdrawalPhase,
    base_tax: &TaxRules,
    granularity: Granularity,
    phase_start_capital: f64,
    year_index: usize,
    rng: &mut R,
) -> (YearState, YearRecord, bool) {
    let rules = phase.tax.as_ref().unwrap_or(base_tax);
    let year = state.year;
    let allowance = rules.allowance_for_year(year);

    let ctx = WithdrawalContext {
        year,
        year_index,
        current_capital: state.capital,
        initial_capital: phase_start_capital,
        trailing_return: state.trailing_return,
        inflation_rate: phase.inflation_rate,
        expected_return: phase.return_mode.expected_rate(),
        gain_fraction: state.gain_fraction(),
        vorab_credit: state.vorab_accumulated,
        rules,
        allowance_remaining: allowance,
    };
    let outcome = compute_withdrawal(&phase.strategy, &ctx, state.withdrawal);

    // Tax withheld from the sale proceeds; the portfolio loses the gross
    // withdrawal, the retiree receives the net.
    let realized = taxes::tax_on_realized_gain(
        outcome.amount,
        ctx.gain_fraction,
        state.vorab_accumulated,
        rules,
        allowance,
    );
    let basis_sold = outcome.amount * (1.0 - ctx.gain_fraction);
    let cost_basis = (state.cost_basis - basis_sold).max(0.0);
    let vorab_credit = state.vorab_accumulated - realized.vorab_credit_used;
    let allowance_left = allowance - realized.allowance_consumed;

    if outcome.exhausted {
        // The final withdrawal empties the portfolio; nothing remains to
        // grow and the driver stops after this record.
        let record = YearRecord {
            year,
            starting_capital: state.capital,
            contributions: 0.0,
            withdrawal: outcome.amount,
            return_amount: 0.0,
            tax_paid: realized.tax,
            allowance_used: realized.allowance_consumed,
            vorab_base: 0.0,
            vorab_accumulated: vorab_credit,
            ending_capital: 0.0,
        };
        let next = YearState {
            year: year + 1,
            capital: 0.0,
            cost_basis: 0.0,
            vorab_accumulated: vorab_credit,
            trailing_return: 0.0,
            withdrawal: outcome.state,
        };
        return (next, record, true);
    }

    // Only the growth portion earns the phase return; for non-bucket
    // strategies the cash bucket is zero and this is the whole portfolio.
    let rate = phase.return_mode.rate_for_year(year, rng);
    let cash_bucket = outcome.state.cash_bucket.min(state.capital - outcome.amount);
    let growth_base = state.capital - outcome.amount - cash_bucket;
    let (grown, return_amount) = grow_for_year(growth_base, 0.0, rate, granularity);

    // Vorabpauschale on the January 1st value, capped at the year's gain.
    let vorab = taxes::vorabpauschale(state.capital, return_amount, rules, allowance_left);
    let ending_capital = (grown + cash_bucket - vorab.tax).max(0.0);

    let record = YearRecord {
        year,
        starting_capital: state.capital,
        contributions: 0.0,
        withdrawal: outcome.amount,
        return_amount,
        tax_paid: realized.tax + vorab.tax,
        allowance_used: realized.allowance_consumed + vorab.allowance_consumed,
        vorab_base: vorab.base,
        vorab_accumulated: vorab_credit + vorab.base,
        ending_capital,
    };

    let next = YearState {
        year: year + 1,
        capital: ending_capital,
        cost_basis,
        vorab_accumulated: vorab_credit + vorab.base,
        trailing_return: rate,
        withdrawal: outcome.state,
    };

    (next, record, false)
}
