use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use envelope_pivot::config::validate_digits;
use envelope_pivot::output::{to_json_pretty, write_json, write_rounds_csv, write_samples_csv};
use envelope_pivot::{
    classify_digits, create_timestamped_output_dir, find_pivot_traced, EnvelopeFamily, RunConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Narrow [digits-lo, digits-hi] down to the SUFF/FAIL pivot
    Pivot,
    /// Classify a single digit count
    Test,
}

#[derive(Debug, Parser)]
#[command(name = "envelope-pivot", version)]
#[command(about = "PASS/FAIL of the prime-counting envelope bound (coarse = pi/B, theta = pi/(B+y)) against a demand")]
struct Cli {
    #[arg(long, value_enum)]
    mode: Mode,

    /// Demand threshold f_dem
    #[arg(long, allow_negative_numbers = true)]
    f_dem: f64,

    #[arg(long)]
    digits_lo: Option<f64>,

    #[arg(long)]
    digits_hi: Option<f64>,

    /// Digit count for --mode test
    #[arg(long)]
    digits: Option<f64>,

    /// Bisection rounds [default: 8]
    #[arg(long)]
    rounds: Option<usize>,

    /// Digit-grid points per round [default: 301]
    #[arg(long = "N")]
    grid_points: Option<usize>,

    /// Tolerance subtracted from f_dem [default: 5e-4]
    #[arg(long)]
    tol: Option<f64>,

    /// coarse = initial model (pi/B), theta = realistic model (pi/(B+y)) [default: theta]
    #[arg(long)]
    envelope: Option<EnvelopeFamily>,

    /// Constant tax subtracted from the raw bound [default: 0]
    #[arg(long, allow_negative_numbers = true)]
    delta_const: Option<f64>,

    /// Sweep y up to K*B [default: 100]
    #[arg(long)]
    y_mult_max: Option<f64>,

    /// Power-ladder steps for y < B [default: 20]
    #[arg(long)]
    y_pow_steps: Option<usize>,

    /// Geometric multipliers between 0.1 and K [default: 30]
    #[arg(long)]
    y_mult_steps: Option<usize>,

    /// JSON file with any subset of the tunables above
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write result.json (and rounds.csv / samples.csv for pivot) into a
    /// timestamped directory under this path
    #[arg(long)]
    trace_dir: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    init_tracing();

    if let Err(error) = try_main(Cli::parse()) {
        eprintln!("envelope-pivot failed: {error:#}");
        std::process::exit(1);
    }
}

fn try_main(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let rendered = run(&cli, &config)?;
    println!("{rendered}");
    Ok(())
}

fn load_config_file(path: &Path) -> Result<RunConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse config: {}", path.display()))
}

/// File values (or defaults) overridden by explicit flags.
fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = match cli.config.as_deref() {
        Some(path) => load_config_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(v) = cli.rounds {
        config.rounds = v;
    }
    if let Some(v) = cli.grid_points {
        config.grid_points = v;
    }
    if let Some(v) = cli.tol {
        config.tol = v;
    }
    if let Some(v) = cli.envelope {
        config.envelope = v;
    }
    if let Some(v) = cli.delta_const {
        config.delta_const = v;
    }
    if let Some(v) = cli.y_mult_max {
        config.y_mult_max = v;
    }
    if let Some(v) = cli.y_pow_steps {
        config.y_pow_steps = v;
    }
    if let Some(v) = cli.y_mult_steps {
        config.y_mult_steps = v;
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli, config: &RunConfig) -> Result<String> {
    let envelope = config.envelope_config();

    match cli.mode {
        Mode::Pivot => {
            let (Some(lo), Some(hi)) = (cli.digits_lo, cli.digits_hi) else {
                bail!("pivot: provide --digits-lo and --digits-hi");
            };
            let params = config.pivot_params(lo, hi, cli.f_dem);
            info!(lo, hi, f_dem = cli.f_dem, envelope = %envelope.family, "starting pivot search");

            let (result, trace) = find_pivot_traced(&params, &envelope)?;
            info!(
                digits_lo = result.digits_lo,
                digits_hi = result.digits_hi,
                digits_star = result.digits_star,
                "pivot search finished"
            );

            if let Some(base) = cli.trace_dir.as_deref() {
                let dir = create_timestamped_output_dir(base)?;
                write_json(&dir.join("result.json"), &result)?;
                write_rounds_csv(&dir.join("rounds.csv"), &trace.rounds)?;
                write_samples_csv(&dir.join("samples.csv"), &trace.samples)?;
                info!(dir = %dir.display(), "wrote pivot trace");
            }

            Ok(to_json_pretty(&result)?)
        }
        Mode::Test => {
            let Some(digits) = cli.digits else {
                bail!("test: provide --digits");
            };
            validate_digits(digits)?;
            let demand = config.demand(cli.f_dem);
            demand.validate()?;

            let verdict = classify_digits(digits, &demand, &envelope);
            info!(digits, status = %verdict.status, "classified");

            if let Some(base) = cli.trace_dir.as_deref() {
                let dir = create_timestamped_output_dir(base)?;
                write_json(&dir.join("result.json"), &verdict)?;
                info!(dir = %dir.display(), "wrote verdict");
            }

            Ok(to_json_pretty(&verdict)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("envelope-pivot").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn defaults_apply_without_flags() {
        let cli = parse(&["--mode", "test", "--f-dem", "0", "--digits", "100"]);
        let config = resolve_config(&cli).expect("config resolves");
        assert_eq!(config.rounds, 8);
        assert_eq!(config.grid_points, 301);
        assert_eq!(config.envelope, EnvelopeFamily::Theta);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--mode", "pivot", "--f-dem", "-0.5", "--digits-lo", "10", "--digits-hi", "1000",
            "--N", "11", "--envelope", "coarse", "--delta-const", "-0.1", "--y-pow-steps", "2",
        ]);
        let config = resolve_config(&cli).expect("config resolves");
        assert_eq!(cli.f_dem, -0.5);
        assert_eq!(config.grid_points, 11);
        assert_eq!(config.envelope, EnvelopeFamily::Coarse);
        assert_eq!(config.delta_const, -0.1);
        assert_eq!(config.y_pow_steps, 2);
    }

    #[test]
    fn config_file_nulls_fall_back_and_flags_win() {
        let path = std::env::temp_dir().join(format!(
            "envelope-pivot-config-{}.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"{ "rounds": 3, "N": null, "tol": null, "y_mult_max": null,
                 "envelope": "coarse", "y_pow_steps": 12 }"#,
        )
        .expect("write config");
        let path_arg = path.to_string_lossy().into_owned();

        let cli = parse(&[
            "--mode", "test", "--f-dem", "0", "--digits", "100", "--config", &path_arg,
            "--y-pow-steps", "6",
        ]);
        let config = resolve_config(&cli).expect("config resolves");
        let _ = fs::remove_file(&path);

        assert_eq!(config.rounds, 3);
        assert_eq!(config.grid_points, 301);
        assert_eq!(config.tol, 5e-4);
        assert_eq!(config.y_mult_max, 100.0);
        assert_eq!(config.envelope, EnvelopeFamily::Coarse);
        assert_eq!(config.y_pow_steps, 6);
        assert_eq!(config.y_mult_steps, 30);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let cli = parse(&[
            "--mode", "test", "--f-dem", "0", "--digits", "100", "--config",
            "/nonexistent/envelope-pivot.json",
        ]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn unknown_envelope_is_rejected() {
        let parsed = Cli::try_parse_from([
            "envelope-pivot", "--mode", "test", "--f-dem", "0", "--envelope", "gamma",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_mode_reports_suff_for_zero_demand() {
        let cli = parse(&[
            "--mode", "test", "--f-dem", "0", "--tol", "0", "--digits", "100", "--envelope", "coarse",
        ]);
        let config = resolve_config(&cli).expect("config resolves");
        let rendered = run(&cli, &config).expect("runs");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(value["status"], "SUFF");
        assert_eq!(value["digits"], 100);
    }

    #[test]
    fn pivot_mode_requires_both_bounds() {
        let cli = parse(&["--mode", "pivot", "--f-dem", "0.1", "--digits-lo", "10"]);
        let config = resolve_config(&cli).expect("config resolves");
        let err = run(&cli, &config).unwrap_err();
        assert!(err.to_string().contains("--digits-hi"));
    }

    #[test]
    fn test_mode_requires_digits() {
        let cli = parse(&["--mode", "test", "--f-dem", "0.1"]);
        let config = resolve_config(&cli).expect("config resolves");
        assert!(run(&cli, &config).is_err());
    }

    #[test]
    fn pivot_mode_rejects_inverted_range() {
        let cli = parse(&[
            "--mode", "pivot", "--f-dem", "0.1", "--digits-lo", "1000", "--digits-hi", "10",
        ]);
        let config = resolve_config(&cli).expect("config resolves");
        assert!(run(&cli, &config).is_err());
    }

    #[test]
    fn pivot_mode_renders_result() {
        let cli = parse(&[
            "--mode", "pivot", "--f-dem", "1e9", "--digits-lo", "10", "--digits-hi", "1000",
            "--rounds", "2", "--N", "5",
        ]);
        let config = resolve_config(&cli).expect("config resolves");
        let rendered = run(&cli, &config).expect("runs");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(value["rounds"], 2);
        assert_eq!(value["digits_star"], 1);
    }
}
