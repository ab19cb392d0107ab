//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - merges them over the environment configuration
//! - runs the sweep
//! - prints the summary and heat map, or hands the surface to the TUI

use clap::Parser;

use crate::cli::{Command, RunArgs, SweepArgs};
use crate::config::{ControllerConfig, GridConfig};
use crate::error::AppError;
use crate::progress::{ConsoleProgress, LogProgress};

pub mod pipeline;

use pipeline::SweepSettings;

const SVG_SIZE: (u32, u32) = (1024, 768);

/// Entry point for the `tecsweep` binary.
pub fn run() -> Result<(), AppError> {
    // `tecsweep` and `tecsweep --outer ...` behave like `tecsweep view ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::View(args) => handle_view(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    crate::logging::init_logging(&args.sweep.log_level, args.sweep.log_file.as_deref())?;
    let settings = settings_from_args(&args.sweep, ControllerConfig::from_env()?)?;

    let output = if args.sweep.quiet {
        pipeline::run_sweep(&settings, &mut LogProgress, None)?
    } else {
        let varying = [settings.grid.outer, settings.grid.inner];
        pipeline::run_sweep(&settings, &mut ConsoleProgress::stdout(varying), None)?
    };

    println!(
        "{}",
        crate::report::format_run_summary(&output.spec, &output.matrix, output.elapsed)
    );
    println!(
        "{}",
        crate::render::render_ascii_heatmap(&output.figure, args.width, args.height)
    );

    if let Some(path) = &args.svg {
        crate::render::write_svg(path, &output.figure, SVG_SIZE)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn handle_view(args: SweepArgs) -> Result<(), AppError> {
    // stderr belongs to the TUI; only log when a file is given.
    if args.log_file.is_some() {
        crate::logging::init_logging(&args.log_level, args.log_file.as_deref())?;
    }
    let settings = settings_from_args(&args, ControllerConfig::from_env()?)?;
    crate::tui::run(settings)
}

/// Layer CLI flags over the environment-derived controller config.
pub fn settings_from_args(args: &SweepArgs, env: ControllerConfig) -> Result<SweepSettings, AppError> {
    let mut controller = env;
    if let Some(program) = &args.controller {
        controller.program = program.clone();
    }
    if !args.controller_args.is_empty() {
        controller.prefix_args = args.controller_args.clone();
    }
    if args.timeout.is_some() {
        controller.timeout = args.timeout;
    }
    if let Some(workers) = args.workers {
        controller.workers = workers;
    }

    let mut grid = GridConfig {
        outer: args.outer,
        inner: args.inner,
        ..GridConfig::default()
    };
    grid.ranges = grid.ranges.with_resolution(args.resolution);
    for r in &args.ranges {
        grid.ranges.set(r.kind, r.descriptor(args.resolution));
    }
    for f in &args.fixed {
        if f.kind == grid.outer || f.kind == grid.inner {
            return Err(AppError::config(format!(
                "--fixed {}: input is swept; use --range to change its samples",
                f.kind
            )));
        }
        grid.fixed[f.kind.arg_index()] = f.value;
    }

    Ok(SweepSettings { controller, grid })
}

/// Rewrite argv so `tecsweep` defaults to `tecsweep view`.
///
/// Rules:
/// - `tecsweep`                      -> `tecsweep view`
/// - `tecsweep --outer ...`          -> `tecsweep view --outer ...`
/// - `tecsweep --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("view".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "view");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "view".to_string());
        return argv;
    }

    argv
}
