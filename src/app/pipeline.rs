//! Shared sweep pipeline used by both the `run` and `view` front-ends.
//!
//! grid config -> `GridSpec` -> controller sweep -> `ResultMatrix` -> `SurfaceFigure`
//!
//! The front-ends only decide how progress is shown and where the figure goes.

use std::time::{Duration, Instant};

use crate::config::{ControllerConfig, GridConfig};
use crate::domain::ResultMatrix;
use crate::error::AppError;
use crate::grid::GridSpec;
use crate::invoke::Controller;
use crate::progress::ProgressReporter;
use crate::render::{SurfaceFigure, SurfaceRenderer};
use crate::sweep::{CancelToken, SweepError, SweepRunner};

/// Fully resolved inputs of one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSettings {
    pub controller: ControllerConfig,
    pub grid: GridConfig,
}

/// All computed outputs of a single sweep.
#[derive(Debug, Clone)]
pub struct SweepOutput {
    pub spec: GridSpec,
    pub matrix: ResultMatrix,
    pub figure: SurfaceFigure,
    pub elapsed: Duration,
}

pub fn build_grid(grid: &GridConfig) -> Result<GridSpec, AppError> {
    Ok(GridSpec::build(
        &grid.ranges,
        grid.outer,
        grid.inner,
        grid.fixed_values(),
    )?)
}

/// Run the configured external controller over the configured grid.
pub fn run_sweep(
    settings: &SweepSettings,
    progress: &mut (dyn ProgressReporter + Send),
    cancel: Option<CancelToken>,
) -> Result<SweepOutput, AppError> {
    let spec = build_grid(&settings.grid)?;
    let controller = settings.controller.controller();
    tracing::info!(
        program = %controller.program().display(),
        timeout = ?settings.controller.timeout,
        workers = settings.controller.workers,
        "resolved controller"
    );
    run_sweep_with(&controller, spec, settings.controller.workers, progress, cancel)
}

/// Sweep `spec` with any `Controller`; `workers > 1` selects the parallel runner.
pub fn run_sweep_with(
    controller: &dyn Controller,
    spec: GridSpec,
    workers: usize,
    progress: &mut (dyn ProgressReporter + Send),
    cancel: Option<CancelToken>,
) -> Result<SweepOutput, AppError> {
    let mut runner = SweepRunner::new(controller);
    if let Some(token) = cancel {
        runner = runner.with_cancel(token);
    }

    let started = Instant::now();
    let result = if workers > 1 {
        runner.run_parallel(&spec, progress, workers)
    } else {
        runner.run(&spec, progress)
    };
    let matrix = result.map_err(|err| {
        let repro = match &err {
            SweepError::Cell { cell, .. } => controller.command_line(cell),
            _ => None,
        };
        AppError::from_sweep(err, repro.as_deref())
    })?;
    let elapsed = started.elapsed();

    let figure = SurfaceRenderer::default().render(spec.outer(), spec.inner(), &matrix)?;
    Ok(SweepOutput {
        spec,
        matrix,
        figure,
        elapsed,
    })
}
