//! Envelope pivot search
//!
//! Estimates an analytic bound f_off(D) for a decimal digit count D by
//! maximizing a ratio built on a closed-form approximation of the
//! prime-counting function pi(y) over a sampled y-grid. The bound is
//! compared against a demand value (SUFF/FAIL), and a sampling bisection
//! narrows a digit-count bracket down to the pivot where the verdict
//! flips from SUFF to FAIL.

pub mod approx;
pub mod classify;
pub mod config;
pub mod envelope;
pub mod grid;
pub mod output;
pub mod pivot;

use thiserror::Error;

pub use classify::{budget, classify_digits, effective_bound, Status, Verdict};
pub use config::{Demand, EnvelopeConfig, EnvelopeFamily, PivotParams, RunConfig};
pub use envelope::f_off;
pub use grid::{digits_geo, y_grid};
pub use output::create_timestamped_output_dir;
pub use pivot::{find_pivot, find_pivot_traced, PivotResult, PivotTrace};

#[derive(Debug, Error)]
pub enum PivotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid digit range: need 0 < digits_lo < digits_hi, got [{lo}, {hi}]")]
    InvalidRange { lo: f64, hi: f64 },
}
