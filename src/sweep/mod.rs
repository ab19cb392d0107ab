//! Grid sweep orchestration.
//!
//! Responsibilities:
//!
//! - walk the grid in row-major order and invoke the controller once per cell
//! - store each reading at its `(outer, inner)` index exactly once
//! - forward progress after every successful cell
//! - abort on the first failure, with enough context to rerun the failing cell by hand
//!
//! The sequential runner is the reference behaviour; `parallel` fans rows out
//! over a fixed-size worker pool with the same fail-fast policy.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::domain::{GridCell, ProgressState, ResultMatrix};
use crate::grid::{GridSpec, IndexedCell};
use crate::invoke::{Controller, InvocationError};
use crate::progress::ProgressReporter;

pub mod parallel;

/// Why a sweep produced no matrix.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A single invocation failed; the whole sweep is abandoned.
    #[error("cell ({row}, {col}) failed after {completed}/{total} completed cells [{cell}]: {source}")]
    Cell {
        row: usize,
        col: usize,
        cell: GridCell,
        /// Cells stored before the failure.
        completed: usize,
        total: usize,
        #[source]
        source: InvocationError,
    },

    #[error("sweep cancelled after {completed}/{total} cells")]
    Cancelled { completed: usize, total: usize },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Cooperative cancellation flag, observed between cells.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives a `Controller` across a `GridSpec`.
pub struct SweepRunner<'a> {
    controller: &'a dyn Controller,
    cancel: Option<CancelToken>,
}

impl<'a> SweepRunner<'a> {
    pub fn new(controller: &'a dyn Controller) -> Self {
        Self {
            controller,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Sequential, row-major sweep.
    pub fn run(
        &self,
        spec: &GridSpec,
        progress: &mut dyn ProgressReporter,
    ) -> Result<ResultMatrix, SweepError> {
        let (rows, cols) = spec.shape();
        let total = spec.total_cells();
        let mut state = ProgressState::new(total);
        let mut matrix = ResultMatrix::zeros(rows, cols);

        tracing::info!(
            outer = %spec.outer().kind(),
            inner = %spec.inner().kind(),
            rows,
            cols,
            total,
            "starting sweep"
        );

        for IndexedCell { row, col, cell } in spec.cells() {
            if self.is_cancelled() {
                progress.abort();
                return Err(SweepError::Cancelled {
                    completed: state.current,
                    total,
                });
            }

            match self.controller.invoke(&cell) {
                Ok(value) => {
                    matrix.set(row, col, value);
                    state.current += 1;
                    progress.report(state, &cell);
                }
                Err(source) => {
                    progress.abort();
                    tracing::error!(row, col, cell = %cell, error = %source, "controller invocation failed");
                    return Err(SweepError::Cell {
                        row,
                        col,
                        cell,
                        completed: state.current,
                        total,
                        source,
                    });
                }
            }
        }

        tracing::info!(total, "sweep finished");
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::domain::{Axis, InputKind};
    use crate::progress::NoProgress;

    /// Records every progress snapshot it receives.
    #[derive(Default)]
    struct Recorder {
        states: Vec<ProgressState>,
        aborted: bool,
    }

    impl ProgressReporter for Recorder {
        fn report(&mut self, state: ProgressState, _cell: &GridCell) {
            self.states.push(state);
        }

        fn abort(&mut self) {
            self.aborted = true;
        }
    }

    fn spec_3x3() -> GridSpec {
        GridSpec::from_axes(
            Axis::new(InputKind::Temperature, vec![10.0, 20.0, 30.0]),
            Axis::new(InputKind::CoolerPower, vec![0.0, 50.0, 100.0]),
            [0.0, 50.0],
        )
        .unwrap()
    }

    #[test]
    fn stores_each_reading_unchanged_at_its_index() {
        let spec = spec_3x3();
        let controller = |cell: &GridCell| -> Result<f64, InvocationError> {
            // Distinct, non-round value per cell.
            Ok(cell.value(InputKind::Temperature) * 1.0001 + cell.value(InputKind::CoolerPower) / 3.0)
        };
        let matrix = SweepRunner::new(&controller).run(&spec, &mut NoProgress).unwrap();

        assert_eq!(matrix.shape(), (3, 3));
        for c in spec.cells() {
            assert_eq!(matrix.get(c.row, c.col), controller(&c.cell).unwrap());
        }
    }

    #[test]
    fn progress_is_monotone_and_ends_at_one_hundred() {
        let spec = spec_3x3();
        let controller = |_: &GridCell| -> Result<f64, InvocationError> { Ok(42.0) };
        let mut recorder = Recorder::default();
        SweepRunner::new(&controller).run(&spec, &mut recorder).unwrap();

        assert_eq!(recorder.states.len(), 9);
        assert!(recorder
            .states
            .windows(2)
            .all(|w| w[0].percentage() <= w[1].percentage()));
        let last = recorder.states.last().unwrap();
        assert_eq!(format!("{:.2}", last.percentage()), "100.00");
        assert!(!recorder.aborted);
    }

    #[test]
    fn first_failure_aborts_the_sweep() {
        let spec = spec_3x3();
        let calls = AtomicUsize::new(0);
        let controller = |cell: &GridCell| -> Result<f64, InvocationError> {
            calls.fetch_add(1, Ordering::SeqCst);
            if cell.value(InputKind::Temperature) == 20.0 && cell.value(InputKind::CoolerPower) == 50.0 {
                return Err(InvocationError::ProcessFailed {
                    reason: "exited with status 1".to_string(),
                    stdout: String::new(),
                    stderr: String::new(),
                });
            }
            Ok(1.0)
        };
        let mut recorder = Recorder::default();
        let err = SweepRunner::new(&controller).run(&spec, &mut recorder).unwrap_err();

        match err {
            SweepError::Cell { row, col, cell, completed, total, source } => {
                assert_eq!((row, col), (1, 1));
                assert_eq!(cell.values(), [20.0, 0.0, 50.0, 50.0]);
                assert_eq!(completed, 4);
                assert_eq!(total, 9);
                assert!(matches!(source, InvocationError::ProcessFailed { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Nothing past the failing cell was attempted.
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(recorder.states.len(), 4);
        assert!(recorder.aborted);
    }

    #[test]
    fn malformed_output_never_becomes_a_zero_cell() {
        let spec = spec_3x3();
        let controller = |_: &GridCell| crate::invoke::parse_output("garbage");
        let err = SweepRunner::new(&controller).run(&spec, &mut NoProgress).unwrap_err();
        assert!(matches!(
            err,
            SweepError::Cell { row: 0, col: 0, source: InvocationError::MalformedOutput { .. }, .. }
        ));
    }

    #[test]
    fn cancellation_is_observed_between_cells() {
        let spec = spec_3x3();
        let token = CancelToken::new();
        let seen = Mutex::new(0usize);
        let controller = |_: &GridCell| -> Result<f64, InvocationError> {
            let mut n = seen.lock().unwrap();
            *n += 1;
            if *n == 2 {
                token.cancel();
            }
            Ok(0.5)
        };
        let err = SweepRunner::new(&controller)
            .with_cancel(token.clone())
            .run(&spec, &mut NoProgress)
            .unwrap_err();

        assert!(matches!(err, SweepError::Cancelled { completed: 2, total: 9 }));
        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
