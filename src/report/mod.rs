//! Reporting utilities: run summaries and failure reports.
//!
//! Formatting lives here so the sweep and render code stay free of
//! presentation concerns.

use std::time::Duration;

use crate::domain::{GridCell, InputKind, ResultMatrix};
use crate::grid::GridSpec;
use crate::invoke::InvocationError;
use crate::sweep::SweepError;

/// Summary of a finished sweep: grid, timing, and where the surface peaks.
pub fn format_run_summary(spec: &GridSpec, matrix: &ResultMatrix, elapsed: Duration) -> String {
    let mut out = String::new();
    let (rows, cols) = matrix.shape();

    out.push_str("=== tecsweep - fan controller response surface ===\n");
    for axis in [spec.outer(), spec.inner()] {
        let [lo, hi] = axis.bounds();
        out.push_str(&format!(
            "Swept: {} {lo}..{hi} ({} samples)\n",
            axis.kind().axis_label(),
            axis.len()
        ));
    }
    let fixed = spec.fixed();
    for (kind, value) in fixed.kinds.iter().zip(fixed.values.iter()) {
        out.push_str(&format!("Fixed: {} = {value}\n", kind.axis_label()));
    }
    out.push_str(&format!(
        "Cells: {} ({rows}x{cols}) in {:.2}s\n",
        rows * cols,
        elapsed.as_secs_f64()
    ));

    if let (Some((lo, hi)), Some(mean)) = (matrix.min_max(), matrix.mean()) {
        out.push_str(&format!("Fan speed: min={lo:.2}% max={hi:.2}% mean={mean:.2}%\n"));
    }
    if let Some(((i, j), v)) = matrix.argmax() {
        out.push_str(&format!(
            "Peak: {v:.2}% at {}={}, {}={}\n",
            spec.outer().kind(),
            spec.outer().values()[i],
            spec.inner().kind(),
            spec.inner().values()[j],
        ));
    }

    out
}

/// Multi-line report for a failed sweep.
///
/// `command_line` is a shell command that reruns the failing cell, when known.
pub fn format_sweep_failure(err: &SweepError, command_line: Option<&str>) -> String {
    let SweepError::Cell {
        row,
        col,
        cell,
        completed,
        total,
        source,
    } = err
    else {
        return format!("Sweep failed: {err}");
    };

    let mut out = String::new();
    out.push_str(&format!("Sweep failed at cell ({row}, {col}): {}\n", failure_kind(source)));
    out.push_str(&format!("  cause:     {source}\n"));
    out.push_str(&format!("  inputs:    {}\n", format_inputs(cell)));
    out.push_str(&format!("  completed: {completed}/{total} cells before the failure\n"));

    let raw = source.raw_output();
    if raw.trim().is_empty() {
        out.push_str("  output:    (empty)\n");
    } else {
        out.push_str("  output:\n");
        for line in raw.lines() {
            out.push_str(&format!("    | {line}\n"));
        }
    }
    if let Some(stderr) = source.raw_stderr()
        && !stderr.trim().is_empty()
    {
        out.push_str("  stderr:\n");
        for line in stderr.lines() {
            out.push_str(&format!("    | {line}\n"));
        }
    }
    if let Some(cmd) = command_line {
        out.push_str(&format!("  reproduce: {cmd}\n"));
    }
    out
}

fn failure_kind(err: &InvocationError) -> &'static str {
    match err {
        InvocationError::ProcessFailed { .. } => "ProcessFailed",
        InvocationError::MalformedOutput { .. } => "MalformedOutput",
        InvocationError::UnparsableValue { .. } => "UnparsableValue",
        InvocationError::TimedOut { .. } => "TimedOut",
    }
}

fn format_inputs(cell: &GridCell) -> String {
    InputKind::ALL
        .iter()
        .map(|&k| format!("{}={}{}", k.cli_name(), cell.value(k), k.unit()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Axis;

    fn spec() -> GridSpec {
        GridSpec::from_axes(
            Axis::new(InputKind::Temperature, vec![10.0, 20.0]),
            Axis::new(InputKind::CoolerPower, vec![0.0, 100.0]),
            [0.0, 50.0],
        )
        .unwrap()
    }

    #[test]
    fn summary_names_the_peak() {
        let m = ResultMatrix::from_rows(&[vec![5.0, 10.0], vec![70.0, 20.0]]).unwrap();
        let txt = format_run_summary(&spec(), &m, Duration::from_millis(1500));
        assert!(txt.contains("Swept: Temperature (°C) 10..20 (2 samples)"));
        assert!(txt.contains("Fixed: Heater Peltier (%) = 50"));
        assert!(txt.contains("Cells: 4 (2x2) in 1.50s"));
        assert!(txt.contains("Peak: 70.00% at temperature=20, cooler-power=0"));
    }

    #[test]
    fn failure_report_carries_reproduction_context() {
        let cell = spec().cell_at(1, 0);
        let err = SweepError::Cell {
            row: 1,
            col: 0,
            cell,
            completed: 2,
            total: 4,
            source: InvocationError::MalformedOutput {
                reason: "missing \": \" delimiter",
                output: "garbage\n".to_string(),
            },
        };
        let txt = format_sweep_failure(&err, Some("./ctl 20 0 0 50"));
        assert!(txt.starts_with("Sweep failed at cell (1, 0): MalformedOutput\n"));
        assert!(txt.contains("inputs:    temperature=20°C, temperature-change=0°C/s, cooler-power=0%, heater-power=50%"));
        assert!(txt.contains("completed: 2/4"));
        assert!(txt.contains("    | garbage\n"));
        assert!(txt.ends_with("  reproduce: ./ctl 20 0 0 50\n"));
    }

    #[test]
    fn timeout_report_includes_partial_output_and_stderr() {
        let err = SweepError::Cell {
            row: 0,
            col: 1,
            cell: spec().cell_at(0, 1),
            completed: 1,
            total: 4,
            source: InvocationError::TimedOut {
                timeout: Duration::from_millis(300),
                stdout: "warming up\n".to_string(),
                stderr: "sensor busy\n".to_string(),
            },
        };
        let txt = format_sweep_failure(&err, None);
        assert!(txt.starts_with("Sweep failed at cell (0, 1): TimedOut\n"));
        assert!(txt.contains("  output:\n    | warming up\n"));
        assert!(txt.contains("  stderr:\n    | sensor busy\n"));
    }
}
