//! External controller process.
//!
//! One synchronous spawn per grid cell. The child is owned by a guard that
//! kills and reaps it on every early exit, so a failing or timed-out cell never
//! leaves a zombie behind.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::domain::GridCell;
use crate::invoke::{Controller, InvocationError, parse_output};

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Runs `<program> [prefix args...] <t> <dt> <cooler> <heater>` per cell.
#[derive(Debug, Clone)]
pub struct ProcessController {
    program: PathBuf,
    prefix_args: Vec<String>,
    timeout: Option<Duration>,
}

impl ProcessController {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
            timeout: None,
        }
    }

    /// Arguments placed before the four input values (e.g. a script path).
    pub fn with_prefix_args(mut self, args: Vec<String>) -> Self {
        self.prefix_args = args;
        self
    }

    /// Bounded wait per invocation; expiry yields `InvocationError::TimedOut`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, cell: &GridCell) -> Result<Captured, InvocationError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .args(cell.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| InvocationError::ProcessFailed {
            reason: format!("failed to launch '{}': {e}", self.program.display()),
            stdout: String::new(),
            stderr: String::new(),
        })?;
        let mut guard = ChildGuard::new(child);

        // Drain both pipes on their own threads so a chatty child cannot block
        // on a full pipe while we wait for it.
        let stdout = guard.child_mut().stdout.take().map(drain);
        let stderr = guard.child_mut().stderr.take().map(drain);

        let waited = match self.timeout {
            None => guard.wait().map(Some),
            Some(limit) => match Instant::now().checked_add(limit) {
                Some(deadline) => guard.wait_until(deadline),
                // Past the end of the clock is the same as no timeout.
                None => guard.wait().map(Some),
            },
        };

        let status = match waited {
            Ok(Some(status)) => status,
            Ok(None) => {
                guard.kill_and_reap();
                // Grandchildren may still hold the pipes open; don't wait on them.
                let stdout = join_within(stdout, DRAIN_GRACE);
                let stderr = join_within(stderr, DRAIN_GRACE);
                return Err(InvocationError::TimedOut {
                    timeout: self.timeout.unwrap_or_default(),
                    stdout,
                    stderr,
                });
            }
            Err(e) => {
                guard.kill_and_reap();
                return Err(InvocationError::ProcessFailed {
                    reason: format!("failed to wait for controller: {e}"),
                    stdout: join(stdout),
                    stderr: join(stderr),
                });
            }
        };

        Ok(Captured {
            status,
            stdout: join(stdout),
            stderr: join(stderr),
        })
    }
}

impl Controller for ProcessController {
    fn invoke(&self, cell: &GridCell) -> Result<f64, InvocationError> {
        let captured = self.run(cell)?;
        tracing::trace!(
            cell = %cell,
            status = %captured.status,
            stdout = %captured.stdout.trim_end(),
            "controller finished"
        );

        if !captured.status.success() {
            return Err(InvocationError::ProcessFailed {
                reason: describe_status(captured.status),
                stdout: captured.stdout,
                stderr: captured.stderr,
            });
        }

        parse_output(&captured.stdout)
    }

    fn command_line(&self, cell: &GridCell) -> Option<String> {
        let mut parts = vec![shell_quote(&self.program.display().to_string())];
        parts.extend(self.prefix_args.iter().map(|a| shell_quote(a)));
        parts.extend(cell.to_args());
        Some(parts.join(" "))
    }
}

struct Captured {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

/// Owns a spawned child until it has been reaped.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child, reaped: false }
    }

    fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    fn wait(&mut self) -> std::io::Result<ExitStatus> {
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status)
    }

    /// `Ok(None)` when `deadline` passes with the child still running.
    fn wait_until(&mut self, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
        loop {
            if let Some(status) = self.child.try_wait()? {
                self.reaped = true;
                return Ok(Some(status));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn kill_and_reap(&mut self) {
        if self.reaped {
            return;
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill_and_reap();
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn join_within(handle: Option<JoinHandle<String>>, grace: Duration) -> String {
    let Some(handle) = handle else {
        return String::new();
    };
    let deadline = Instant::now() + grace;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return String::new();
        }
        thread::sleep(POLL_INTERVAL);
    }
    handle.join().unwrap_or_default()
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with status {code}"),
        None => format!("terminated abnormally ({status})"),
    }
}

fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | '='));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
