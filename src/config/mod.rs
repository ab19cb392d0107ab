//! Runtime configuration.
//!
//! Resolution order, lowest to highest priority:
//!
//! 1. built-in defaults
//! 2. environment (`TEC_CONTROLLER`, `TEC_TIMEOUT_SECS`, `TEC_WORKERS`), including a `.env` file
//! 3. command-line flags
//!
//! Env parsing goes through a lookup closure so it can be tested without
//! touching the process environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::InputKind;
use crate::error::AppError;
use crate::grid::InputRanges;
use crate::invoke::ProcessController;

pub const DEFAULT_CONTROLLER: &str = "./out/TecFanControl.out";

pub const ENV_CONTROLLER: &str = "TEC_CONTROLLER";
pub const ENV_TIMEOUT_SECS: &str = "TEC_TIMEOUT_SECS";
pub const ENV_WORKERS: &str = "TEC_WORKERS";

/// How to run the external controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub program: PathBuf,
    pub prefix_args: Vec<String>,
    pub timeout: Option<Duration>,
    /// 1 selects the sequential runner.
    pub workers: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_CONTROLLER),
            prefix_args: Vec::new(),
            timeout: None,
            workers: 1,
        }
    }
}

impl ControllerConfig {
    /// Read the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut cfg = Self::default();

        if let Some(program) = lookup(ENV_CONTROLLER).filter(|s| !s.trim().is_empty()) {
            cfg.program = PathBuf::from(program.trim());
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|s| !s.trim().is_empty()) {
            let secs = parse_timeout_secs(&raw)
                .map_err(|e| AppError::config(format!("{ENV_TIMEOUT_SECS}: {e}")))?;
            cfg.timeout = Some(secs);
        }
        if let Some(raw) = lookup(ENV_WORKERS).filter(|s| !s.trim().is_empty()) {
            cfg.workers = parse_workers(&raw)
                .map_err(|e| AppError::config(format!("{ENV_WORKERS}: {e}")))?;
        }

        Ok(cfg)
    }

    pub fn controller(&self) -> ProcessController {
        ProcessController::new(&self.program)
            .with_prefix_args(self.prefix_args.clone())
            .with_timeout(self.timeout)
    }
}

/// Positive, finite number of seconds.
pub fn parse_timeout_secs(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("expected a number of seconds, got {raw:?}"))?;
    if !(secs.is_finite() && secs > 0.0) {
        return Err(format!("timeout must be a positive number of seconds, got {raw:?}"));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| format!("timeout is out of range, got {raw:?}"))
}

pub fn parse_workers(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("expected a worker count >= 1, got {raw:?}")),
    }
}

/// Everything needed to build the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub ranges: InputRanges,
    pub outer: InputKind,
    pub inner: InputKind,
    /// Values for the two non-swept inputs, indexed by argument position.
    pub fixed: [f64; 4],
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            ranges: InputRanges::default(),
            outer: InputKind::Temperature,
            inner: InputKind::CoolerPower,
            fixed: InputKind::ALL.map(InputKind::default_fixed_value),
        }
    }
}

impl GridConfig {
    /// Fixed values for the two kinds not being swept, in argument order.
    pub fn fixed_values(&self) -> [f64; 2] {
        crate::grid::fixed_kinds_for(self.outer, self.inner).map(|k| self.fixed[k.arg_index()])
    }
}
