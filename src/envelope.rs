use crate::approx::{coarse, tighter};
use crate::config::{EnvelopeConfig, EnvelopeFamily};
use crate::grid::y_grid;

/// Grid points at or below this y are skipped; the log-based estimates are
/// unreliable there.
pub const Y_CUTOFF: f64 = 10.0;

impl EnvelopeFamily {
    /// Ratio maximized by the envelope at a single y.
    pub fn ratio(self, y: f64, budget: f64) -> f64 {
        match self {
            Self::Coarse => coarse(y) / budget,
            Self::Theta => tighter(y) / (budget + y),
        }
    }
}

/// Raw bound `f_off(B)`: the largest family ratio over the y-grid, or 0 when
/// no grid point lies above `Y_CUTOFF`.
pub fn f_off(budget: f64, config: &EnvelopeConfig) -> f64 {
    y_grid(budget, config)
        .into_iter()
        .filter(|&y| y > Y_CUTOFF)
        .map(|y| config.family.ratio(y, budget))
        .fold(0.0, |best, f| if f > best { f } else { best })
}
