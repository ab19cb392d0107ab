//! `tec-surface` library crate.
//!
//! The binary (`tecsweep`) is a thin wrapper around this library so that:
//!
//! - the sweep can be driven by any `Controller`, including test doubles
//! - grid, sweep and render stages are testable without spawning processes
//! - the CLI and TUI front-ends share one pipeline

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod grid;
pub mod invoke;
pub mod logging;
pub mod progress;
pub mod render;
pub mod report;
pub mod sweep;
pub mod tui;
