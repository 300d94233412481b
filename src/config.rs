use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PivotError;

/// Lower bound on the number of power-ladder steps below the budget.
pub const MIN_Y_POW_STEPS: usize = 4;
/// Lower bound on the number of geometric multipliers above 0.1 * B.
pub const MIN_Y_MULT_STEPS: usize = 10;
/// Lower bound on the largest y multiplier K.
pub const MIN_Y_MULT_MAX: f64 = 3.0;
/// Lower bound on the digit-grid resolution per pivot round.
pub const MIN_DIGIT_GRID_POINTS: usize = 3;
/// Lower bound on the number of pivot rounds.
pub const MIN_ROUNDS: usize = 1;

pub const DEFAULT_ROUNDS: usize = 8;
pub const DEFAULT_DIGIT_GRID_POINTS: usize = 301;
pub const DEFAULT_TOL: f64 = 5e-4;
pub const DEFAULT_Y_MULT_MAX: f64 = 100.0;
pub const DEFAULT_Y_POW_STEPS: usize = 20;
pub const DEFAULT_Y_MULT_STEPS: usize = 30;

/// Which ratio the envelope maximizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeFamily {
    /// `pi(y) / B` with the coarse estimate.
    Coarse,
    /// `pi(y) / (B + y)` with the tighter estimate, theta(y) ~ y.
    #[default]
    Theta,
}

impl EnvelopeFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Coarse => "coarse",
            Self::Theta => "theta",
        }
    }
}

impl fmt::Display for EnvelopeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvelopeFamily {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coarse" => Ok(Self::Coarse),
            "theta" => Ok(Self::Theta),
            other => Err(PivotError::InvalidConfig(format!(
                "unknown envelope '{other}', expected coarse or theta"
            ))),
        }
    }
}

/// Shape of the y-grid and the ratio evaluated over it.
///
/// Fields hold the caller's values verbatim so results can echo them; the
/// accessors apply the clamps and are what the grid builder consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    #[serde(rename = "envelope")]
    pub family: EnvelopeFamily,
    pub y_mult_max: f64,
    pub y_pow_steps: usize,
    pub y_mult_steps: usize,
}

impl EnvelopeConfig {
    pub fn new(
        family: EnvelopeFamily,
        y_mult_max: f64,
        y_pow_steps: usize,
        y_mult_steps: usize,
    ) -> Self {
        Self {
            family,
            y_mult_max,
            y_pow_steps,
            y_mult_steps,
        }
    }

    pub fn mult_max(&self) -> f64 {
        self.y_mult_max.max(MIN_Y_MULT_MAX)
    }

    pub fn pow_steps(&self) -> usize {
        self.y_pow_steps.max(MIN_Y_POW_STEPS)
    }

    pub fn mult_steps(&self) -> usize {
        self.y_mult_steps.max(MIN_Y_MULT_STEPS)
    }

    /// Number of points `y_grid` produces for any budget.
    pub fn grid_len(&self) -> usize {
        (self.pow_steps() - 1) + self.mult_steps()
    }
}

/// Demand side of a classification: SUFF iff `raw - delta_const >= f_dem - tol`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub f_dem: f64,
    pub tol: f64,
    pub delta_const: f64,
}

impl Demand {
    pub fn new(f_dem: f64, tol: f64, delta_const: f64) -> Self {
        Self {
            f_dem,
            tol,
            delta_const,
        }
    }

    /// Smallest effective bound that still counts as SUFF.
    pub fn threshold(&self) -> f64 {
        self.f_dem - self.tol
    }

    pub fn validate(&self) -> Result<(), PivotError> {
        if !self.f_dem.is_finite() || !self.tol.is_finite() || !self.delta_const.is_finite() {
            return Err(PivotError::InvalidConfig(
                "f_dem, tol and delta_const must be finite".to_string(),
            ));
        }

        if self.tol < 0.0 {
            return Err(PivotError::InvalidConfig(
                "tol must be non-negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Inputs of the pivot search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotParams {
    pub digits_lo: f64,
    pub digits_hi: f64,
    pub rounds: usize,
    pub grid_points: usize,
    pub demand: Demand,
}

impl PivotParams {
    pub fn rounds(&self) -> usize {
        self.rounds.max(MIN_ROUNDS)
    }

    pub fn grid_points(&self) -> usize {
        self.grid_points.max(MIN_DIGIT_GRID_POINTS)
    }

    pub fn validate(&self) -> Result<(), PivotError> {
        validate_range(self.digits_lo, self.digits_hi)?;
        self.demand.validate()
    }
}

pub(crate) fn validate_range(lo: f64, hi: f64) -> Result<(), PivotError> {
    if !lo.is_finite() || !hi.is_finite() || lo <= 0.0 || hi <= 0.0 || lo >= hi {
        return Err(PivotError::InvalidRange { lo, hi });
    }
    Ok(())
}

/// Single-point mode needs a finite, strictly positive digit count.
pub fn validate_digits(digits: f64) -> Result<(), PivotError> {
    if !digits.is_finite() || digits <= 0.0 {
        return Err(PivotError::InvalidConfig(format!(
            "digits must be finite and greater than zero, got {digits}"
        )));
    }
    Ok(())
}

/// Tunables shared by both modes, loadable from a JSON file.
///
/// This is the only place defaults exist; the numerical core always
/// receives an explicit `EnvelopeConfig` / `PivotParams`. Fields missing
/// from the file or set to `null` take the value of `RunConfig::default()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RunConfigFile")]
pub struct RunConfig {
    pub rounds: usize,
    #[serde(rename = "N")]
    pub grid_points: usize,
    pub tol: f64,
    pub envelope: EnvelopeFamily,
    pub delta_const: f64,
    pub y_mult_max: f64,
    pub y_pow_steps: usize,
    pub y_mult_steps: usize,
}

/// On-disk shape of `RunConfig`; `None` covers both absent and `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunConfigFile {
    rounds: Option<usize>,
    #[serde(rename = "N")]
    grid_points: Option<usize>,
    tol: Option<f64>,
    envelope: Option<EnvelopeFamily>,
    delta_const: Option<f64>,
    y_mult_max: Option<f64>,
    y_pow_steps: Option<usize>,
    y_mult_steps: Option<usize>,
}

impl From<RunConfigFile> for RunConfig {
    fn from(file: RunConfigFile) -> Self {
        let defaults = RunConfig::default();
        Self {
            rounds: file.rounds.unwrap_or(defaults.rounds),
            grid_points: file.grid_points.unwrap_or(defaults.grid_points),
            tol: file.tol.unwrap_or(defaults.tol),
            envelope: file.envelope.unwrap_or(defaults.envelope),
            delta_const: file.delta_const.unwrap_or(defaults.delta_const),
            y_mult_max: file.y_mult_max.unwrap_or(defaults.y_mult_max),
            y_pow_steps: file.y_pow_steps.unwrap_or(defaults.y_pow_steps),
            y_mult_steps: file.y_mult_steps.unwrap_or(defaults.y_mult_steps),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            grid_points: DEFAULT_DIGIT_GRID_POINTS,
            tol: DEFAULT_TOL,
            envelope: EnvelopeFamily::Theta,
            delta_const: 0.0,
            y_mult_max: DEFAULT_Y_MULT_MAX,
            y_pow_steps: DEFAULT_Y_POW_STEPS,
            y_mult_steps: DEFAULT_Y_MULT_STEPS,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), PivotError> {
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(PivotError::InvalidConfig(
                "tol must be finite and non-negative".to_string(),
            ));
        }

        if !self.delta_const.is_finite() {
            return Err(PivotError::InvalidConfig(
                "delta_const must be finite".to_string(),
            ));
        }

        if !self.y_mult_max.is_finite() || self.y_mult_max <= 0.0 {
            return Err(PivotError::InvalidConfig(
                "y_mult_max must be finite and greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn envelope_config(&self) -> EnvelopeConfig {
        EnvelopeConfig::new(
            self.envelope,
            self.y_mult_max,
            self.y_pow_steps,
            self.y_mult_steps,
        )
    }

    pub fn demand(&self, f_dem: f64) -> Demand {
        Demand::new(f_dem, self.tol, self.delta_const)
    }

    pub fn pivot_params(&self, digits_lo: f64, digits_hi: f64, f_dem: f64) -> PivotParams {
        PivotParams {
            digits_lo,
            digits_hi,
            rounds: self.rounds,
            grid_points: self.grid_points,
            demand: self.demand(f_dem),
        }
    }
}
