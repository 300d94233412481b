use crate::config::{validate_range, EnvelopeConfig, MIN_DIGIT_GRID_POINTS};
use crate::PivotError;

/// Smallest multiplier of the supra-budget regime.
pub const Y_MULT_MIN: f64 = 0.1;

/// Candidate y-values for a budget `B`.
///
/// The power ladder `B^(i/steps)` for `i = 1..steps-1` covers y < B and
/// leaves out both degenerate endpoints. It is followed by the geometric
/// multipliers `m_i = 0.1 * r^i`, `r = (K / 0.1)^(1/(m_steps-1))`, giving
/// `y = m_i * B` up to `K * B`.
pub fn y_grid(budget: f64, config: &EnvelopeConfig) -> Vec<f64> {
    let pow_steps = config.pow_steps();
    let mult_steps = config.mult_steps();
    let mut grid = Vec::with_capacity(config.grid_len());

    grid.extend((1..pow_steps).map(|i| budget.powf(i as f64 / pow_steps as f64)));

    let ratio = (config.mult_max() / Y_MULT_MIN).powf(1.0 / (mult_steps - 1) as f64);
    grid.extend((0..mult_steps).map(|i| Y_MULT_MIN * ratio.powf(i as f64) * budget));

    grid
}

/// Geometric digit grid of `n` points (at least 3) from `lo` to `hi`.
pub fn digits_geo(lo: f64, hi: f64, n: usize) -> Result<Vec<f64>, PivotError> {
    validate_range(lo, hi)?;

    let n = n.max(MIN_DIGIT_GRID_POINTS);
    let ratio = (hi / lo).powf(1.0 / (n - 1) as f64);
    Ok((0..n).map(|i| lo * ratio.powf(i as f64)).collect())
}
