use std::f64::consts::LN_10;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use tracing::trace;

use crate::config::{Demand, EnvelopeConfig};
use crate::envelope::f_off;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Suff,
    Fail,
}

impl Status {
    /// Non-strict: a bound exactly at `f_dem - tol` is SUFF.
    pub fn from_bound(f_off_eff: f64, demand: &Demand) -> Self {
        if f_off_eff >= demand.threshold() {
            Self::Suff
        } else {
            Self::Fail
        }
    }

    pub fn is_suff(self) -> bool {
        self == Self::Suff
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Suff => "SUFF",
            Self::Fail => "FAIL",
        })
    }
}

/// Single-point classification, flat for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Integer part of the classified digit count.
    #[serde(serialize_with = "serialize_integral")]
    pub digits: f64,
    pub status: Status,
    pub f_off_eff: f64,
    #[serde(flatten)]
    pub demand: Demand,
    #[serde(flatten)]
    pub envelope: EnvelopeConfig,
}

/// Writes an integral `f64` as a JSON integer while it fits in `u64`.
/// Larger values are kept as floats instead of saturating.
pub(crate) fn serialize_integral<S: Serializer>(
    value: &f64,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if *value >= 0.0 && *value < u64::MAX as f64 {
        serializer.serialize_u64(*value as u64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Natural-log budget of a decimal digit count: `B = D * ln 10`.
pub fn budget(digits: f64) -> f64 {
    digits * LN_10
}

/// `f_off(D * ln 10) - delta_const`.
pub fn effective_bound(digits: f64, demand: &Demand, envelope: &EnvelopeConfig) -> f64 {
    f_off(budget(digits), envelope) - demand.delta_const
}

pub fn classify_digits(digits: f64, demand: &Demand, envelope: &EnvelopeConfig) -> Verdict {
    let f_off_eff = effective_bound(digits, demand, envelope);
    let status = Status::from_bound(f_off_eff, demand);
    trace!(digits, f_off_eff, %status, "classified digit count");

    Verdict {
        digits: digits.trunc(),
        status,
        f_off_eff,
        demand: *demand,
        envelope: *envelope,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvelopeFamily;

    fn coarse() -> EnvelopeConfig {
        EnvelopeConfig::new(EnvelopeFamily::Coarse, 100.0, 20, 30)
    }

    #[test]
    fn coarse_meets_zero_demand() {
        let verdict = classify_digits(100.0, &Demand::new(0.0, 0.0, 0.0), &coarse());
        assert_eq!(verdict.status, Status::Suff);
        assert_eq!(verdict.digits, 100.0);
        assert!(verdict.f_off_eff > 0.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let env = coarse();
        let raw = effective_bound(100.0, &Demand::new(0.0, 0.0, 0.0), &env);

        let at = classify_digits(100.0, &Demand::new(raw, 0.0, 0.0), &env);
        assert_eq!(at.status, Status::Suff);

        let above = classify_digits(100.0, &Demand::new(raw * 1.001, 0.0, 0.0), &env);
        assert_eq!(above.status, Status::Fail);

        let within_tol = classify_digits(100.0, &Demand::new(raw + 0.5, 0.5, 0.0), &env);
        assert_eq!(within_tol.status, Status::Suff);
    }

    #[test]
    fn delta_const_is_subtracted() {
        let env = EnvelopeConfig::new(EnvelopeFamily::Theta, 100.0, 20, 30);
        let base = classify_digits(42.0, &Demand::new(0.0, 0.0, 0.0), &env);
        let taxed = classify_digits(42.0, &Demand::new(0.0, 0.0, 0.25), &env);
        assert!((base.f_off_eff - taxed.f_off_eff - 0.25).abs() < 1e-15);
    }

    #[test]
    fn status_agrees_with_bound_for_many_inputs() {
        let env = EnvelopeConfig::new(EnvelopeFamily::Theta, 100.0, 20, 30);
        for (i, digits) in [3.0, 10.5, 77.0, 1_000.0, 1.0e5].into_iter().enumerate() {
            let demand = Demand::new(0.02 * i as f64, 1e-3, 0.01);
            let verdict = classify_digits(digits, &demand, &env);
            assert_eq!(
                verdict.status.is_suff(),
                verdict.f_off_eff >= demand.f_dem - demand.tol
            );
        }
    }

    #[test]
    fn digits_are_truncated() {
        let verdict = classify_digits(99.9, &Demand::new(0.0, 0.0, 0.0), &coarse());
        assert_eq!(verdict.digits, 99.0);
    }

    #[test]
    fn verdict_serializes_flat() {
        let verdict = classify_digits(100.0, &Demand::new(0.0, 5e-4, 0.0), &coarse());
        let value = serde_json::to_value(&verdict).expect("serializes");
        assert_eq!(value["status"], "SUFF");
        assert_eq!(value["envelope"], "coarse");
        assert_eq!(value["digits"], 100);
        assert_eq!(value["y_pow_steps"], 20);
        assert!(value["f_dem"].is_number());
    }

    #[test]
    fn huge_digit_counts_keep_their_integer_part() {
        let verdict = classify_digits(3.5e25, &Demand::new(0.0, 0.0, 0.0), &coarse());
        assert_eq!(verdict.digits, 3.5e25);
        let value = serde_json::to_value(&verdict).expect("serializes");
        assert_eq!(value["digits"].as_f64(), Some(3.5e25));
        assert!(!value["digits"].is_u64());
    }
}
