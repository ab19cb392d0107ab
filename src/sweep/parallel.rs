//! Row-parallel sweep on a fixed-size rayon pool.
//!
//! Each worker owns whole rows, so matrix storage needs no synchronization.
//! Progress goes through a mutex, which keeps `current` strictly increasing.
//! The first failure observed wins and stops new cells from starting; which
//! failure that is depends on scheduling, while successful results do not.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;

use crate::domain::{ProgressState, ResultMatrix};
use crate::grid::{GridSpec, IndexedCell};
use crate::progress::ProgressReporter;
use crate::sweep::{SweepError, SweepRunner};

struct Shared<'p> {
    state: ProgressState,
    progress: &'p mut (dyn ProgressReporter + Send),
    first_error: Option<SweepError>,
}

impl SweepRunner<'_> {
    /// Sweep with `workers` concurrent invocations.
    pub fn run_parallel(
        &self,
        spec: &GridSpec,
        progress: &mut (dyn ProgressReporter + Send),
        workers: usize,
    ) -> Result<ResultMatrix, SweepError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
            .map_err(|e| SweepError::WorkerPool(e.to_string()))?;

        let (rows, cols) = spec.shape();
        let total = spec.total_cells();
        tracing::info!(
            outer = %spec.outer().kind(),
            inner = %spec.inner().kind(),
            rows,
            cols,
            total,
            workers,
            "starting parallel sweep"
        );

        let shared = Mutex::new(Shared {
            state: ProgressState::new(total),
            progress,
            first_error: None,
        });
        let stop = AtomicBool::new(false);

        let row_values: Vec<Option<Vec<f64>>> = pool.install(|| {
            (0..rows)
                .into_par_iter()
                .map(|row| self.run_row(spec, row, &shared, &stop))
                .collect()
        });

        let shared = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(err) = shared.first_error {
            shared.progress.abort();
            return Err(err);
        }
        if self.is_cancelled() || row_values.iter().any(Option::is_none) {
            shared.progress.abort();
            return Err(SweepError::Cancelled {
                completed: shared.state.current,
                total,
            });
        }

        let mut matrix = ResultMatrix::zeros(rows, cols);
        for (row, values) in row_values.into_iter().flatten().enumerate() {
            for (col, value) in values.into_iter().enumerate() {
                matrix.set(row, col, value);
            }
        }

        tracing::info!(total, "parallel sweep finished");
        Ok(matrix)
    }

    /// `None` when the row was abandoned (failure elsewhere or cancellation).
    fn run_row(
        &self,
        spec: &GridSpec,
        row: usize,
        shared: &Mutex<Shared<'_>>,
        stop: &AtomicBool,
    ) -> Option<Vec<f64>> {
        let mut values = Vec::with_capacity(spec.inner().len());
        for IndexedCell { col, cell, .. } in spec.row_cells(row) {
            if stop.load(Ordering::SeqCst) || self.is_cancelled() {
                return None;
            }

            match self.controller.invoke(&cell) {
                Ok(value) => {
                    values.push(value);
                    let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    guard.state.current += 1;
                    let state = guard.state;
                    guard.progress.report(state, &cell);
                }
                Err(source) => {
                    stop.store(true, Ordering::SeqCst);
                    let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    if guard.first_error.is_none() {
                        tracing::error!(row, col, cell = %cell, error = %source, "controller invocation failed");
                        guard.first_error = Some(SweepError::Cell {
                            row,
                            col,
                            cell,
                            completed: guard.state.current,
                            total: guard.state.total,
                            source,
                        });
                    }
                    return None;
                }
            }
        }
        Some(values)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::domain::{Axis, GridCell, InputKind};
    use crate::invoke::InvocationError;
    use crate::progress::NoProgress;
    use crate::sweep::CancelToken;

    #[derive(Default)]
    struct Recorder(Vec<ProgressState>);

    impl ProgressReporter for Recorder {
        fn report(&mut self, state: ProgressState, _cell: &GridCell) {
            self.0.push(state);
        }
    }

    fn spec(rows: usize, cols: usize) -> GridSpec {
        GridSpec::from_axes(
            Axis::new(InputKind::Temperature, (0..rows).map(|i| 10.0 + i as f64).collect()),
            Axis::new(InputKind::HeaterPower, (0..cols).map(|j| j as f64 * 2.5).collect()),
            [0.0, 50.0],
        )
        .unwrap()
    }

    fn reading(cell: &GridCell) -> Result<f64, InvocationError> {
        Ok(cell.value(InputKind::Temperature).sqrt() + cell.value(InputKind::HeaterPower) / 7.0)
    }

    #[test]
    fn matches_sequential_result() {
        let spec = spec(7, 5);
        let sequential = SweepRunner::new(&reading).run(&spec, &mut NoProgress).unwrap();
        let parallel = SweepRunner::new(&reading)
            .run_parallel(&spec, &mut NoProgress, 4)
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn progress_stays_monotone_under_concurrency() {
        let spec = spec(6, 6);
        let mut recorder = Recorder::default();
        SweepRunner::new(&reading)
            .run_parallel(&spec, &mut recorder, 3)
            .unwrap();

        let currents: Vec<usize> = recorder.0.iter().map(|s| s.current).collect();
        assert_eq!(currents, (1..=36).collect::<Vec<_>>());
        assert_eq!(recorder.0.last().unwrap().percentage(), 100.0);
    }

    #[test]
    fn failure_aborts_and_reports_one_error() {
        let spec = spec(8, 4);
        let calls = AtomicUsize::new(0);
        let controller = |cell: &GridCell| -> Result<f64, InvocationError> {
            calls.fetch_add(1, Ordering::SeqCst);
            if cell.value(InputKind::Temperature) == 13.0 {
                return Err(InvocationError::UnparsableValue {
                    value: "x".to_string(),
                    output: "Fan speed: x%".to_string(),
                });
            }
            Ok(1.0)
        };
        let err = SweepRunner::new(&controller)
            .run_parallel(&spec, &mut NoProgress, 2)
            .unwrap_err();

        match err {
            SweepError::Cell { row, col, source, .. } => {
                assert_eq!((row, col), (3, 0));
                assert!(matches!(source, InvocationError::UnparsableValue { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(calls.load(Ordering::SeqCst) <= 32);
    }

    #[test]
    fn cancellation_stops_workers_between_cells() {
        let spec = spec(8, 4);
        let token = CancelToken::new();
        let calls = AtomicUsize::new(0);
        let controller = |_: &GridCell| -> Result<f64, InvocationError> {
            if calls.fetch_add(1, Ordering::SeqCst) + 1 == 5 {
                token.cancel();
            }
            Ok(1.0)
        };
        let mut recorder = Recorder::default();
        let err = SweepRunner::new(&controller)
            .with_cancel(token.clone())
            .run_parallel(&spec, &mut recorder, 2)
            .unwrap_err();

        match err {
            SweepError::Cancelled { completed, total } => {
                assert_eq!(total, 32);
                assert!(completed >= 5 && completed < total);
                assert_eq!(completed, recorder.0.len());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(calls.load(Ordering::SeqCst) < 32);
    }
}
