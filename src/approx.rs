//! Closed-form estimates of the prime-counting function pi(y).
//!
//! Both estimators clamp `y <= e^2` up to `e^2 + 1` before taking the
//! logarithm, so they are total over the positive reals.

use std::f64::consts::E;

/// Inputs at or below this value are lifted to `LOG_FLOOR + 1`.
pub const LOG_FLOOR: f64 = E * E;

/// Denominators of `tighter` at or below this are treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

fn clamp_domain(y: f64) -> f64 {
    if y <= LOG_FLOOR {
        LOG_FLOOR + 1.0
    } else {
        y
    }
}

/// First-pass optimistic estimate: `pi(y) ~ (y / ln y) * (1 + 1 / ln y)`.
pub fn coarse(y: f64) -> f64 {
    let y = clamp_domain(y);
    let ly = y.ln();
    (y / ly) * (1.0 + 1.0 / ly)
}

/// Tighter estimate: `pi(y) ~ y / (ln y - 1)`, or 0 when the denominator
/// is near zero.
pub fn tighter(y: f64) -> f64 {
    let y = clamp_domain(y);
    let den = y.ln() - 1.0;
    if den > SINGULAR_EPS {
        y / den
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{coarse, tighter, LOG_FLOOR};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn coarse_clamps_at_e_squared() {
        assert_eq!(coarse(LOG_FLOOR), coarse(LOG_FLOOR + 1.0));
        assert_eq!(coarse(1.0), coarse(LOG_FLOOR + 1.0));
        assert_eq!(tighter(0.5), tighter(LOG_FLOOR + 1.0));
    }

    #[test]
    fn coarse_matches_closed_form() {
        let y = 1.0e6_f64;
        let ly = y.ln();
        let expected = (y / ly) * (1.0 + 1.0 / ly);
        assert!((coarse(y) - expected).abs() < 1e-9);
    }

    #[test]
    fn tighter_matches_closed_form() {
        let y = 1.0e6_f64;
        let expected = y / (y.ln() - 1.0);
        assert!((tighter(y) - expected).abs() < 1e-9);
        // pi(1e6) = 78498; both estimates land within a few percent.
        assert!((tighter(y) - 78_498.0).abs() / 78_498.0 < 0.05);
        assert!((coarse(y) - 78_498.0).abs() / 78_498.0 < 0.05);
    }

    #[test]
    fn estimates_are_finite_and_non_negative() {
        let mut rng = StdRng::seed_from_u64(0x51_u64);
        for _ in 0..2_000 {
            let exponent: f64 = rng.gen_range(-6.0..300.0);
            let y = 10f64.powf(exponent);
            for value in [coarse(y), tighter(y)] {
                assert!(value.is_finite(), "non-finite estimate at y={y}");
                assert!(value >= 0.0, "negative estimate at y={y}");
            }
        }
    }

    #[test]
    fn estimates_are_deterministic() {
        let y = 12_345.678;
        assert_eq!(coarse(y).to_bits(), coarse(y).to_bits());
        assert_eq!(tighter(y).to_bits(), tighter(y).to_bits());
    }
}
