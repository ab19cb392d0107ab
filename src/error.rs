//! Binary-boundary error: a message plus the process exit code.
//!
//! Library modules return their own `thiserror` enums; they are folded into
//! `AppError` only on the way out of `app`.

use crate::grid::GridError;
use crate::render::RenderError;
use crate::sweep::SweepError;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INVOCATION: u8 = 3;
pub const EXIT_RENDER: u8 = 4;
pub const EXIT_CANCELLED: u8 = 5;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Convert a sweep failure, appending a reproduction command when one is known.
    pub fn from_sweep(err: SweepError, command_line: Option<&str>) -> Self {
        let code = match err {
            SweepError::Cell { .. } => EXIT_INVOCATION,
            SweepError::Cancelled { .. } => EXIT_CANCELLED,
            SweepError::WorkerPool(_) => EXIT_CONFIG,
        };
        let message = crate::report::format_sweep_failure(&err, command_line);
        Self::new(code, message.trim_end())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<GridError> for AppError {
    fn from(err: GridError) -> Self {
        Self::new(EXIT_CONFIG, format!("Invalid grid: {err}"))
    }
}

impl From<SweepError> for AppError {
    fn from(err: SweepError) -> Self {
        Self::from_sweep(err, None)
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        Self::new(EXIT_RENDER, format!("Render failed: {err}"))
    }
}
