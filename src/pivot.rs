//! Sampling bisection over a digit-count bracket.
//!
//! Each round classifies a geometric digit grid spanning the current
//! bracket, then either tightens the bracket around the first SUFF to FAIL
//! edge or shifts it one decade up (all SUFF) or down (otherwise).

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{effective_bound, serialize_integral, Status};
use crate::config::{Demand, EnvelopeConfig, PivotParams};
use crate::grid::digits_geo;
use crate::PivotError;

const DECADE: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotResult {
    pub digits_lo: f64,
    pub digits_hi: f64,
    /// Integer part of `digits_hi`, the edge where failure is confirmed.
    #[serde(serialize_with = "serialize_integral")]
    pub digits_star: f64,
    #[serde(rename = "N")]
    pub grid_points: usize,
    pub rounds: usize,
    #[serde(flatten)]
    pub demand: Demand,
    #[serde(flatten)]
    pub envelope: EnvelopeConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// New bracket is `[grid[index - 1], grid[index]]`.
    Transition { index: usize },
    ShiftUp,
    ShiftDown,
}

impl RoundOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transition { .. } => "transition",
            Self::ShiftUp => "shift_up",
            Self::ShiftDown => "shift_down",
        }
    }

    pub fn edge_index(&self) -> Option<usize> {
        match self {
            Self::Transition { index } => Some(*index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotRound {
    pub round: usize,
    pub lo: f64,
    pub hi: f64,
    pub outcome: RoundOutcome,
    pub suff_count: usize,
    pub next_lo: f64,
    pub next_hi: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSample {
    pub round: usize,
    pub index: usize,
    pub digits: f64,
    pub f_off_eff: f64,
    pub status: Status,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PivotTrace {
    pub rounds: Vec<PivotRound>,
    pub samples: Vec<GridSample>,
}

/// Index of the first FAIL preceded by at least one SUFF.
///
/// Only the first SUFF to FAIL edge is reported; later edges of a
/// non-monotone curve are ignored.
pub fn first_falling_edge(suff: &[bool]) -> Option<usize> {
    let mut seen_suff = false;
    for (idx, &ok) in suff.iter().enumerate() {
        if ok {
            seen_suff = true;
        } else if seen_suff {
            return Some(idx);
        }
    }
    None
}

/// Decide the next bracket from one round's grid and verdicts.
fn advance(grid: &[f64], suff: &[bool]) -> (RoundOutcome, f64, f64) {
    if let Some(index) = first_falling_edge(suff) {
        return (RoundOutcome::Transition { index }, grid[index - 1], grid[index]);
    }

    let first = grid[0];
    let last = grid[grid.len() - 1];
    if suff.iter().all(|&ok| ok) {
        (RoundOutcome::ShiftUp, last, last * DECADE)
    } else {
        (RoundOutcome::ShiftDown, first / DECADE, first)
    }
}

pub fn find_pivot(
    params: &PivotParams,
    envelope: &EnvelopeConfig,
) -> Result<PivotResult, PivotError> {
    run_search(params, envelope, None)
}

/// Same search as [`find_pivot`], also returning every round and sample.
pub fn find_pivot_traced(
    params: &PivotParams,
    envelope: &EnvelopeConfig,
) -> Result<(PivotResult, PivotTrace), PivotError> {
    let mut trace = PivotTrace::default();
    let result = run_search(params, envelope, Some(&mut trace))?;
    Ok((result, trace))
}

fn run_search(
    params: &PivotParams,
    envelope: &EnvelopeConfig,
    mut trace: Option<&mut PivotTrace>,
) -> Result<PivotResult, PivotError> {
    params.validate()?;

    let demand = &params.demand;
    let (mut lo, mut hi) = (params.digits_lo, params.digits_hi);

    for round in 0..params.rounds() {
        let grid = digits_geo(lo, hi, params.grid_points())?;
        let bounds: Vec<f64> = grid
            .par_iter()
            .map(|&digits| effective_bound(digits, demand, envelope))
            .collect();
        let suff: Vec<bool> = bounds
            .iter()
            .map(|&f| Status::from_bound(f, demand).is_suff())
            .collect();

        let (outcome, next_lo, next_hi) = advance(&grid, &suff);
        let suff_count = suff.iter().filter(|&&ok| ok).count();
        debug!(
            round,
            lo,
            hi,
            outcome = outcome.label(),
            suff_count,
            next_lo,
            next_hi,
            "pivot round"
        );

        if let Some(trace) = trace.as_deref_mut() {
            trace.samples.extend(grid.iter().zip(&bounds).enumerate().map(
                |(index, (&digits, &f_off_eff))| GridSample {
                    round,
                    index,
                    digits,
                    f_off_eff,
                    status: Status::from_bound(f_off_eff, demand),
                },
            ));
            trace.rounds.push(PivotRound {
                round,
                lo,
                hi,
                outcome,
                suff_count,
                next_lo,
                next_hi,
            });
        }

        lo = next_lo;
        hi = next_hi;
    }

    Ok(PivotResult {
        digits_lo: lo,
        digits_hi: hi,
        digits_star: hi.trunc(),
        grid_points: params.grid_points,
        rounds: params.rounds,
        demand: *demand,
        envelope: *envelope,
    })
}
