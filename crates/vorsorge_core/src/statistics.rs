//! Statistics helpers for cross-scenario aggregation
//!
//! Numeric edge cases (zero baselines, empty inputs, zero-year horizons)
//! are represented as `None` so callers can render an explicit
//! "undefined" instead of propagating NaN or infinity.

/// Arithmetic mean. `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation. `None` for an empty slice.
#[must_use]
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Percentile using the lower method: `sorted[floor(p * (n - 1))]`.
///
/// The input must already be sorted ascending. No interpolation: with the
/// small scenario counts this engine compares, a fixed, documented index
/// rule beats a library-dependent interpolation default.
#[must_use]
pub fn percentile_lower(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let idx = (p * (sorted.len() - 1) as f64).floor() as usize;
    Some(sorted[idx])
}

/// Relative deviation `(value - baseline) / baseline`.
///
/// `None` when the baseline is zero or either input is non-finite; never
/// NaN or infinity.
#[must_use]
pub fn calculate_deviation(value: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 || !value.is_finite() || !baseline.is_finite() {
        return None;
    }
    Some((value - baseline) / baseline)
}

/// Annualized rate from a start and end value over a number of years.
/// `None` when the horizon is empty or the start value is not positive.
#[must_use]
pub fn annualized_return(start: f64, end: f64, years: usize) -> Option<f64> {
    if years == 0 || start <= 0.0 || end < 0.0 {
        return None;
    }
    Some((end / start).powf(1.0 / years as f64) - 1.0)
}

/// Geometric mean rate from per-year growth factors.
/// `None` when no factors are given or any factor is non-positive.
#[must_use]
pub fn geometric_mean_rate(factors: &[f64]) -> Option<f64> {
    if factors.is_empty() || factors.iter().any(|f| *f <= 0.0) {
        return None;
    }
    let product: f64 = factors.iter().product();
    Some(product.powf(1.0 / factors.len() as f64) - 1.0)
}

/// Deflate a nominal value by a constant inflation rate over `years`.
#[must_use]
pub fn real_value(nominal: f64, inflation_rate: f64, years: usize) -> f64 {
    if inflation_rate == 0.0 || years == 0 {
        return nominal;
    }
    nominal / (1.0 + inflation_rate).powi(years as i32)
}
