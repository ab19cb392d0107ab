//! Controller invocation.
//!
//! A `Controller` turns one `GridCell` into one fan-speed reading. The
//! production implementation (`ProcessController`) runs the external binary;
//! tests substitute closures.

use std::time::Duration;

use thiserror::Error;

use crate::domain::GridCell;

pub mod parse;
pub mod process;

pub use parse::parse_output;
pub use process::ProcessController;

/// Why a single invocation did not produce a reading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvocationError {
    /// Non-zero exit, death by signal, or launch failure.
    #[error("controller process failed: {reason}")]
    ProcessFailed {
        reason: String,
        stdout: String,
        stderr: String,
    },

    /// No output lines, or the last line lacks the `": "` delimiter.
    #[error("malformed controller output ({reason}): {output:?}")]
    MalformedOutput { reason: &'static str, output: String },

    #[error("unparsable value {value:?} in controller output: {output:?}")]
    UnparsableValue { value: String, output: String },

    #[error("controller did not finish within {timeout:?}")]
    TimedOut {
        timeout: Duration,
        stdout: String,
        stderr: String,
    },
}

impl InvocationError {
    /// Raw standard output captured from the failing invocation.
    pub fn raw_output(&self) -> &str {
        match self {
            InvocationError::ProcessFailed { stdout, .. } => stdout,
            InvocationError::MalformedOutput { output, .. } => output,
            InvocationError::UnparsableValue { output, .. } => output,
            InvocationError::TimedOut { stdout, .. } => stdout,
        }
    }

    /// Standard error captured from the failing invocation, when the process ran.
    pub fn raw_stderr(&self) -> Option<&str> {
        match self {
            InvocationError::ProcessFailed { stderr, .. } => Some(stderr),
            InvocationError::TimedOut { stderr, .. } => Some(stderr),
            InvocationError::MalformedOutput { .. } | InvocationError::UnparsableValue { .. } => None,
        }
    }
}

/// Something that maps a controller input tuple to a fan-speed reading.
///
/// Implementations must be callable from several worker threads at once;
/// each call is independent.
pub trait Controller: Send + Sync {
    fn invoke(&self, cell: &GridCell) -> Result<f64, InvocationError>;

    /// Shell-style command line that reproduces `cell`, when there is one.
    fn command_line(&self, _cell: &GridCell) -> Option<String> {
        None
    }
}

impl<F> Controller for F
where
    F: Fn(&GridCell) -> Result<f64, InvocationError> + Send + Sync,
{
    fn invoke(&self, cell: &GridCell) -> Result<f64, InvocationError> {
        self(cell)
    }
}
