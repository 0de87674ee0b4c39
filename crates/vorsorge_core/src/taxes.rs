//! German capital-gains tax primitives
//!
//! Stateless single-year building blocks: Teilfreistellung (partial
//! exemption), Freibetrag (allowance) consumption, Günstigerprüfung
//! (favorable assessment) and the Vorabpauschale deemed-gain mechanism.
//! Quotas and rates are validated at the configuration boundary, not here.

use crate::model::TaxRules;

/// Statutory fraction of the Basiszins that enters the Vorabpauschale base
const VORAB_BASE_FACTOR: f64 = 0.7;

/// Portion of a gross gain that remains taxable after partial exemption.
#[must_use]
pub fn taxable_portion(gross_gain: f64, partial_exemption_quota: f64) -> f64 {
    gross_gain * (1.0 - partial_exemption_quota)
}

/// Result of consuming allowance against a taxable amount.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AllowanceOutcome {
    /// Tax due on the amount left after the allowance
    pub tax_due: f64,
    /// Allowance consumed, never more than was remaining
    pub allowance_consumed: f64,
}

/// Consume allowance first, then tax the remainder at the given rate.
#[must_use]
pub fn apply_allowance(taxable_amount: f64, allowance_remaining: f64, tax_rate: f64) -> AllowanceOutcome {
    let taxable = taxable_amount.max(0.0);
    let allowance_consumed = taxable.min(allowance_remaining.max(0.0));
    AllowanceOutcome {
        tax_due: (taxable - allowance_consumed) * tax_rate,
        allowance_consumed,
    }
}

/// Günstigerprüfung: the lower of flat tax and personal-rate tax when a
/// personal rate is configured, otherwise the flat tax unconditionally.
#[must_use]
pub fn favorable_assessment(flat_tax: f64, personal_rate_tax: Option<f64>) -> f64 {
    personal_rate_tax.map_or(flat_tax, |personal| flat_tax.min(personal))
}

/// Tax on a gross gain through the full pipeline: partial exemption,
/// allowance, favorable assessment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GainTax {
    pub tax: f64,
    pub allowance_consumed: f64,
}

#[must_use]
pub fn tax_on_gain(gross_gain: f64, rules: &TaxRules, allowance_remaining: f64) -> GainTax {
    let taxable = taxable_portion(gross_gain.max(0.0), rules.partial_exemption_quota);
    let flat = apply_allowance(taxable, allowance_remaining, rules.tax_rate);
    let personal = rules
        .personal_tax_rate
        .map(|rate| apply_allowance(taxable, allowance_remaining, rate).tax_due);
    GainTax {
        tax: favorable_assessment(flat.tax_due, personal),
        allowance_consumed: flat.allowance_consumed,
    }
}

// ============================================================================
// Vorabpauschale
// ============================================================================

/// Deemed-gain base for one year: 70 % of the Basiszins applied to the
/// start-of-year capital, capped at the actual growth and floored at zero.
#[must_use]
pub fn vorabpauschale_base(start_capital: f64, base_rate: f64, actual_gain: f64) -> f64 {
    let basisertrag = start_capital.max(0.0) * base_rate * VORAB_BASE_FACTOR;
    basisertrag.min(actual_gain).max(0.0)
}

/// Result of taxing the Vorabpauschale for one year.
///
/// The taxed `base` is accumulated by the caller and credited against
/// realized gains at withdrawal; it must never be taxed a second time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VorabTax {
    pub base: f64,
    pub tax: f64,
    pub allowance_consumed: f64,
}

/// Compute the Vorabpauschale base and run it through the tax pipeline.
#[must_use]
pub fn vorabpauschale(
    start_capital: f64,
    actual_gain: f64,
    rules: &TaxRules,
    allowance_remaining: f64,
) -> VorabTax {
    let base = vorabpauschale_base(start_capital, rules.vorab_base_rate, actual_gain);
    let gain_tax = tax_on_gain(base, rules, allowance_remaining);
    VorabTax {
        base,
        tax: gain_tax.tax,
        allowance_consumed: gain_tax.allowance_consumed,
    }
}

// ============================================================================
// Realized gains at withdrawal
// ============================================================================

/// Result of taxing the gains realized by one withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RealizedGainTax {
    /// Gain realized by the withdrawal before any offsets
    pub realized_gain: f64,
    /// Accumulated Vorabpauschale credit consumed against the gain
    pub vorab_credit_used: f64,
    pub tax: f64,
    pub allowance_consumed: f64,
}

/// Tax the gains realized by withdrawing `amount` from a portfolio whose
/// unrealized gain fraction is `gain_fraction`.
///
/// Already-taxed Vorabpauschale bases reduce the gain first so deemed
/// gains are not taxed twice at realization.
#[must_use]
pub fn tax_on_realized_gain(
    amount: f64,
    gain_fraction: f64,
    vorab_credit: f64,
    rules: &TaxRules,
    allowance_remaining: f64,
) -> RealizedGainTax {
    let realized_gain = amount.max(0.0) * gain_fraction.clamp(0.0, 1.0);
    let vorab_credit_used = realized_gain.min(vorab_credit.max(0.0));
    let gain_tax = tax_on_gain(
        realized_gain - vorab_credit_used,
        rules,
        allowance_remaining,
    );
    RealizedGainTax {
        realized_gain,
        vorab_credit_used,
        tax: gain_tax.tax,
        allowance_consumed: gain_tax.allowance_consumed,
    }
}
