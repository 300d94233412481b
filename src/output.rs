use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::Writer;
use serde::Serialize;

use crate::pivot::{GridSample, PivotRound};
use crate::PivotError;

/// Create `<base>/<UTC timestamp>` (suffixed `-NN` on collision).
pub fn create_timestamped_output_dir(base: &Path) -> Result<PathBuf, PivotError> {
    fs::create_dir_all(base)?;

    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let mut output_dir = base.join(&timestamp);
    let mut counter = 1_u32;

    while output_dir.exists() {
        output_dir = base.join(format!("{timestamp}-{counter:02}"));
        counter += 1;
    }

    fs::create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn fmt_f64(value: f64) -> String {
    format!("{value:.10}")
}

fn fmt_option_usize(value: Option<usize>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, PivotError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn write_json(path: &Path, value: &impl Serialize) -> Result<(), PivotError> {
    let payload = to_json_pretty(value)?;
    fs::write(path, payload)?;
    Ok(())
}

pub fn write_rounds_csv(path: &Path, rounds: &[PivotRound]) -> Result<(), PivotError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record([
        "round",
        "lo",
        "hi",
        "outcome",
        "edge_index",
        "suff_count",
        "next_lo",
        "next_hi",
    ])?;

    for row in rounds {
        writer.write_record([
            row.round.to_string(),
            fmt_f64(row.lo),
            fmt_f64(row.hi),
            row.outcome.label().to_string(),
            fmt_option_usize(row.outcome.edge_index()),
            row.suff_count.to_string(),
            fmt_f64(row.next_lo),
            fmt_f64(row.next_hi),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_samples_csv(path: &Path, samples: &[GridSample]) -> Result<(), PivotError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["round", "index", "digits", "f_off_eff", "status"])?;

    for sample in samples {
        writer.write_record([
            sample.round.to_string(),
            sample.index.to_string(),
            fmt_f64(sample.digits),
            fmt_f64(sample.f_off_eff),
            sample.status.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
