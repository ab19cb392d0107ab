//! Command-line parsing for the fan-controller sweep.
//!
//! Parsing and validation of individual flag values lives here; merging with
//! the environment happens in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{AxisDescriptor, InputKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "tecsweep",
    version,
    about = "Sweep a TEC fan controller over two inputs and plot the fan-speed surface"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the sweep, print a summary and a heat map, and optionally write an SVG.
    Run(RunArgs),
    /// Run the sweep and explore the surface in the terminal UI.
    View(SweepArgs),
}

/// Options shared by every subcommand that runs a sweep.
#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    /// Controller executable (overrides TEC_CONTROLLER).
    #[arg(long, value_name = "PATH")]
    pub controller: Option<PathBuf>,

    /// Extra argument placed before the four input values. Repeatable.
    #[arg(long = "controller-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub controller_args: Vec<String>,

    /// Per-invocation timeout in seconds (overrides TEC_TIMEOUT_SECS).
    #[arg(long, value_name = "SECS", value_parser = parse_timeout_arg)]
    pub timeout: Option<std::time::Duration>,

    /// Concurrent controller invocations (overrides TEC_WORKERS).
    #[arg(long, value_name = "N", value_parser = parse_workers_arg)]
    pub workers: Option<usize>,

    /// Input swept along the matrix rows.
    #[arg(long, value_enum, default_value_t = InputKind::Temperature)]
    pub outer: InputKind,

    /// Input swept along the matrix columns.
    #[arg(long, value_enum, default_value_t = InputKind::CoolerPower)]
    pub inner: InputKind,

    /// Samples per swept axis unless a --range gives its own.
    #[arg(long, default_value_t = crate::domain::DEFAULT_RESOLUTION)]
    pub resolution: usize,

    /// Sample range for an input, e.g. `temperature=10:45` or `cooler-power=0:100:25`.
    #[arg(long = "range", value_name = "KIND=MIN:MAX[:N]", value_parser = parse_range_override)]
    pub ranges: Vec<RangeOverride>,

    /// Value held for a non-swept input, e.g. `heater-power=30`.
    #[arg(long = "fixed", value_name = "KIND=VALUE", value_parser = parse_fixed_override, allow_hyphen_values = true)]
    pub fixed: Vec<FixedOverride>,

    /// Suppress the progress line.
    #[arg(short, long)]
    pub quiet: bool,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, default_value = crate::logging::DEFAULT_LEVEL)]
    pub log_level: String,

    /// Write logs to this file instead of stderr. `view` logs nothing without it.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub sweep: SweepArgs,

    /// Also write the 3D surface to this SVG file.
    #[arg(long, value_name = "PATH")]
    pub svg: Option<PathBuf>,

    /// Heat map width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Heat map height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// `--range KIND=MIN:MAX[:N]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeOverride {
    pub kind: InputKind,
    pub min: f64,
    pub max: f64,
    pub resolution: Option<usize>,
}

impl RangeOverride {
    pub fn descriptor(&self, default_resolution: usize) -> AxisDescriptor {
        AxisDescriptor {
            min: self.min,
            max: self.max,
            resolution: self.resolution.unwrap_or(default_resolution),
        }
    }
}

/// `--fixed KIND=VALUE`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedOverride {
    pub kind: InputKind,
    pub value: f64,
}

fn parse_kind(raw: &str) -> Result<InputKind, String> {
    InputKind::from_str(raw.trim(), true).map_err(|_| {
        let names: Vec<&str> = InputKind::ALL.iter().map(|k| k.cli_name()).collect();
        format!("unknown input {raw:?} (expected one of: {})", names.join(", "))
    })
}

fn parse_number(raw: &str, what: &str) -> Result<f64, String> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{what} must be a number, got {raw:?}"))?;
    if !v.is_finite() {
        return Err(format!("{what} must be finite, got {raw:?}"));
    }
    Ok(v)
}

pub fn parse_range_override(raw: &str) -> Result<RangeOverride, String> {
    let (kind, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=MIN:MAX[:N], got {raw:?}"))?;
    let kind = parse_kind(kind)?;

    let parts: Vec<&str> = rest.split(':').collect();
    let (min, max, resolution) = match parts.as_slice() {
        [min, max] => (min, max, None),
        [min, max, n] => {
            let n = n
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("resolution must be a positive integer, got {n:?}"))?;
            (min, max, Some(n))
        }
        _ => return Err(format!("expected KIND=MIN:MAX[:N], got {raw:?}")),
    };

    Ok(RangeOverride {
        kind,
        min: parse_number(min, "min")?,
        max: parse_number(max, "max")?,
        resolution,
    })
}

pub fn parse_fixed_override(raw: &str) -> Result<FixedOverride, String> {
    let (kind, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=VALUE, got {raw:?}"))?;
    Ok(FixedOverride {
        kind: parse_kind(kind)?,
        value: parse_number(value, "value")?,
    })
}

fn parse_timeout_arg(raw: &str) -> Result<std::time::Duration, String> {
    crate::config::parse_timeout_secs(raw)
}

fn parse_workers_arg(raw: &str) -> Result<usize, String> {
    crate::config::parse_workers(raw)
}
