//! `tracing` subscriber setup.
//!
//! Logs go to stderr by default so they never interleave with the progress
//! line on stdout. `--log-file` redirects them to a file (append, no ANSI),
//! which is the only sensible choice while the TUI owns the terminal.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::AppError;

pub const DEFAULT_LEVEL: &str = "warn";

/// Hands out writers that share one log file.
#[derive(Clone)]
struct FileWriterFactory {
    file: Arc<Mutex<File>>,
}

struct FileWriter {
    file: Arc<Mutex<File>>,
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner).write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }
}

impl<'a> MakeWriter<'a> for FileWriterFactory {
    type Writer = FileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        FileWriter {
            file: self.file.clone(),
        }
    }
}

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(level: &str) -> String {
    format!("tec_surface={level}")
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(level)))
        .map_err(|e| AppError::config(format!("Invalid log level {level:?}: {e}")))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    AppError::config(format!("Failed to open log file {}: {e}", path.display()))
                })?;
            let writer = FileWriterFactory {
                file: Arc::new(Mutex::new(file)),
            };
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
                .try_init()
        }
        None => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
    };

    // A subscriber may already be installed (e.g. by a test harness).
    if let Err(e) = installed {
        tracing::debug!(error = %e, "logging already initialized");
    }
    Ok(())
}
