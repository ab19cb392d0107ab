//! Full sweeps against stub controller scripts run through `/bin/sh`.
#![cfg(unix)]

use std::io::Write;
use std::path::Path;

use tec_surface::app::pipeline::{self, SweepSettings};
use tec_surface::config::{ControllerConfig, GridConfig};
use tec_surface::domain::{Axis, AxisDescriptor, InputKind};
use tec_surface::grid::GridSpec;
use tec_surface::invoke::ProcessController;
use tec_surface::progress::{ConsoleProgress, NoProgress};
use tec_surface::render::{SurfaceRenderer, render_ascii_heatmap, render_svg_string};
use tec_surface::sweep::{SweepError, SweepRunner};

fn script(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{body}").unwrap();
    file.flush().unwrap();
    file
}

fn sh(script: &Path) -> ProcessController {
    ProcessController::new("/bin/sh").with_prefix_args(vec![script.display().to_string()])
}

fn scenario_grid() -> GridSpec {
    GridSpec::from_axes(
        Axis::new(InputKind::Temperature, vec![10.0, 20.0, 30.0]),
        Axis::new(InputKind::CoolerPower, vec![0.0, 50.0, 100.0]),
        [0.0, 50.0],
    )
    .unwrap()
}

#[test]
fn constant_controller_fills_three_by_three_grid() {
    let dir = tempfile::tempdir().unwrap();
    let calls = dir.path().join("calls");
    let stub = script(&format!(
        "echo x >> '{}'\necho 'Fan speed: 42.00%'",
        calls.display()
    ));

    let controller = sh(stub.path());
    let mut progress = ConsoleProgress::new(
        Vec::new(),
        [InputKind::Temperature, InputKind::CoolerPower],
    );
    let matrix = SweepRunner::new(&controller)
        .run(&scenario_grid(), &mut progress)
        .unwrap();

    assert_eq!(matrix.shape(), (3, 3));
    assert!(matrix.iter().all(|v| v == 42.0));

    let invocations = std::fs::read_to_string(&calls).unwrap();
    assert_eq!(invocations.lines().count(), 9);

    let console = String::from_utf8(progress.into_inner()).unwrap();
    assert!(console.contains("\rProgress: 11.11% (1/9) - Temperature: 10, Cooler Peltier: 0"));
    assert!(console.ends_with("Progress: 100.00% - Completed\n"));
}

#[test]
fn controller_sees_each_cell_in_argument_order() {
    // Echo back temperature + cooler power so every cell is distinct.
    let stub = script(r#"echo "Fan speed: $(( $1 + $3 ))%""#);
    let controller = sh(stub.path());
    let matrix = SweepRunner::new(&controller)
        .run(&scenario_grid(), &mut NoProgress)
        .unwrap();

    assert_eq!(matrix.row(0), vec![10.0, 60.0, 110.0]);
    assert_eq!(matrix.row(2), vec![30.0, 80.0, 130.0]);
}

#[test]
fn non_zero_exit_aborts_with_reproducible_context() {
    let dir = tempfile::tempdir().unwrap();
    let calls = dir.path().join("calls");
    // Fails on the second temperature row, middle column.
    let stub = script(&format!(
        "echo x >> '{}'\nif [ \"$1\" = 20 ] && [ \"$3\" = 50 ]; then echo boom >&2; exit 7; fi\necho 'Fan speed: 1%'",
        calls.display()
    ));

    let controller = sh(stub.path());
    let err = SweepRunner::new(&controller)
        .run(&scenario_grid(), &mut NoProgress)
        .unwrap_err();

    match &err {
        SweepError::Cell { row, col, completed, total, .. } => {
            assert_eq!((*row, *col), (1, 1));
            assert_eq!((*completed, *total), (4, 9));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&calls).unwrap().lines().count(), 5);

    let app_err = tec_surface::error::AppError::from_sweep(err, Some("/bin/sh stub 20 0 50 50"));
    assert_eq!(app_err.exit_code(), 3);
    let text = app_err.to_string();
    assert!(text.contains("ProcessFailed"));
    assert!(text.contains("    | boom"));
    assert!(text.contains("reproduce: /bin/sh stub 20 0 50 50"));
}

#[test]
fn pipeline_renders_heatmap_and_svg_from_settings() {
    let stub = script(r#"echo "Fan speed: $3%""#);
    let mut grid = GridConfig::default();
    grid.ranges.set(
        InputKind::Temperature,
        AxisDescriptor { min: 10.0, max: 30.0, resolution: 3 },
    );
    grid.ranges.set(
        InputKind::CoolerPower,
        AxisDescriptor { min: 0.0, max: 100.0, resolution: 5 },
    );
    let settings = SweepSettings {
        controller: ControllerConfig {
            program: "/bin/sh".into(),
            prefix_args: vec![stub.path().display().to_string()],
            timeout: None,
            workers: 2,
        },
        grid,
    };

    let output = pipeline::run_sweep(&settings, &mut NoProgress, None).unwrap();
    assert_eq!(output.matrix.shape(), (3, 5));
    assert_eq!(output.matrix.row(1), vec![0.0, 25.0, 50.0, 75.0, 100.0]);

    let heatmap = render_ascii_heatmap(&output.figure, 5, 3);
    assert!(heatmap.ends_with("| :+#@|\n| :+#@|\n| :+#@|\n"));

    let svg = render_svg_string(&output.figure, (400, 300)).unwrap();
    assert!(svg.contains("Cooler Peltier (%)"));
}

#[test]
fn renderer_rejects_matrix_from_other_grid() {
    let stub = script("echo 'Fan speed: 5%'");
    let controller = sh(stub.path());
    let matrix = SweepRunner::new(&controller)
        .run(&scenario_grid(), &mut NoProgress)
        .unwrap();

    let wider = Axis::new(InputKind::CoolerPower, vec![0.0, 25.0, 50.0, 75.0]);
    assert!(
        SurfaceRenderer::default()
            .render(scenario_grid().outer(), &wider, &matrix)
            .is_err()
    );
}
