//! Sweep progress reporting.
//!
//! Reporters are purely observational: the sweep hands them a snapshot after
//! each completed cell and never reads anything back.

use std::io::{self, Write};

use crate::domain::{GridCell, InputKind, ProgressState};

/// Receives progress after every completed cell.
pub trait ProgressReporter {
    /// Called after each successful cell. `state.current` never decreases.
    fn report(&mut self, state: ProgressState, cell: &GridCell);

    /// Called when the sweep stops early (failure or cancellation).
    fn abort(&mut self) {}
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _state: ProgressState, _cell: &GridCell) {}
}

/// Single carriage-return-overwritten status line, finalized with a newline.
pub struct ConsoleProgress<W: Write> {
    out: W,
    varying: [InputKind; 2],
    line_open: bool,
}

impl ConsoleProgress<io::Stdout> {
    pub fn stdout(varying: [InputKind; 2]) -> Self {
        Self::new(io::stdout(), varying)
    }
}

impl<W: Write> ConsoleProgress<W> {
    /// `varying` names the two swept inputs shown on the status line.
    pub fn new(out: W, varying: [InputKind; 2]) -> Self {
        Self {
            out,
            varying,
            line_open: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressReporter for ConsoleProgress<W> {
    fn report(&mut self, state: ProgressState, cell: &GridCell) {
        let [a, b] = self.varying;
        // Progress output is best-effort; a closed stdout must not stop the sweep.
        let _ = write!(
            self.out,
            "\rProgress: {}% ({}/{}) - {}: {}, {}: {}",
            format_percentage(state),
            state.current,
            state.total,
            a.display_name(),
            cell.value(a),
            b.display_name(),
            cell.value(b),
        );
        self.line_open = true;

        if state.is_complete() {
            let _ = writeln!(self.out);
            let _ = writeln!(self.out, "Progress: {}% - Completed", format_percentage(state));
            self.line_open = false;
        }
        let _ = self.out.flush();
    }

    fn abort(&mut self) {
        if self.line_open {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
            self.line_open = false;
        }
    }
}

/// Emits progress as `tracing` events instead of a console line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&mut self, state: ProgressState, cell: &GridCell) {
        tracing::debug!(
            current = state.current,
            total = state.total,
            percent = %format_percentage(state),
            cell = %cell,
            "sweep progress"
        );
        if state.is_complete() {
            tracing::info!(total = state.total, "sweep completed");
        }
    }

    fn abort(&mut self) {
        tracing::warn!("sweep aborted");
    }
}

/// Percentage with two decimals, e.g. `33.33`.
pub fn format_percentage(state: ProgressState) -> String {
    format!("{:.2}", state.percentage())
}
