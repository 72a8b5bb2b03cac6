//! External tool invocation
//!
//! A [`Tool`] runs one executable against one input under a timeout and
//! always hands back a [`RunResult`]. Timeouts, missing executables and spawn
//! errors become `succeeded = false` plus a synthetic `fatal:` diagnostic, so
//! one misbehaving tool can never abort the rest of the corpus.

use crate::config::ToolSpec;
use crate::error::ParityError;
use crate::extract::{ErrorRecord, extract};
use crate::result::Result;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Why a run did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFailure {
    /// Process ran to completion with a non-zero status
    Exited { code: i32 },
    /// Process was terminated by a signal
    Signalled,
    TimedOut { after: Duration },
    SpawnFailed { message: String },
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunFailure::Exited { code } => write!(f, "exited with status {code}"),
            RunFailure::Signalled => f.write_str("terminated by signal"),
            RunFailure::TimedOut { after } => write!(f, "timed out after {}s", after.as_secs()),
            RunFailure::SpawnFailed { message } => write!(f, "failed to start: {message}"),
        }
    }
}

/// Outcome of one (tool, input) invocation
#[derive(Debug, Clone)]
pub struct RunResult {
    succeeded: bool,
    exit_code: Option<i32>,
    failure: Option<RunFailure>,
    stdout: String,
    stderr: String,
    combined_output: String,
    duration: Duration,
}

impl RunResult {
    /// A process that ran to completion
    pub fn completed(
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let stdout = stdout.into();
        let mut stderr = stderr.into();

        let failure = match exit_code {
            Some(0) => None,
            Some(code) => Some(RunFailure::Exited { code }),
            None => Some(RunFailure::Signalled),
        };
        if failure == Some(RunFailure::Signalled) {
            push_line(&mut stderr, "fatal: process terminated by signal");
        }

        let combined_output = join_streams(&stdout, &stderr);
        Self {
            succeeded: failure.is_none(),
            exit_code,
            failure,
            stdout,
            stderr,
            combined_output,
            duration,
        }
    }

    /// A process that never produced a status; `diagnostic` becomes the only output
    pub fn failed(failure: RunFailure, diagnostic: impl Into<String>, duration: Duration) -> Self {
        let stderr = diagnostic.into();
        Self {
            succeeded: false,
            exit_code: None,
            failure: Some(failure),
            stdout: String::new(),
            combined_output: stderr.clone(),
            stderr,
            duration,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        self.failure.as_ref()
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Stdout followed by stderr
    pub fn combined_output(&self) -> &str {
        &self.combined_output
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Normalized diagnostics, derived from the combined output on each call
    pub fn diagnostic_messages(&self) -> Vec<ErrorRecord> {
        extract(&self.combined_output)
    }
}

fn push_line(buf: &mut String, line: &str) {
    if !buf.is_empty() && !buf.ends_with('\n') {
        buf.push('\n');
    }
    buf.push_str(line);
    buf.push('\n');
}

fn join_streams(stdout: &str, stderr: &str) -> String {
    let mut combined = String::with_capacity(stdout.len() + stderr.len() + 1);
    combined.push_str(stdout);
    if !stderr.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(stderr);
    }
    combined
}

/// A located, ready-to-run external tool
#[derive(Debug, Clone)]
pub struct Tool {
    name: String,
    program: PathBuf,
    script: Option<PathBuf>,
    args: Vec<String>,
    timeout: Duration,
}

impl Tool {
    /// Locate the tool's executable (and script) before any case runs
    pub fn resolve(spec: &ToolSpec) -> Result<Self> {
        let program = locate_program(&spec.program).ok_or_else(|| {
            ParityError::ExecutableNotFound {
                tool: spec.name.clone(),
                path: spec.program.clone(),
            }
        })?;

        if let Some(script) = &spec.script
            && !script.is_file()
        {
            return Err(ParityError::ScriptNotFound {
                tool: spec.name.clone(),
                path: script.clone(),
            });
        }

        debug!("Resolved {} to {}", spec.name, program.display());
        Ok(Self {
            program,
            ..Self::from_spec(spec)
        })
    }

    /// Build a tool without checking that it exists
    pub fn from_spec(spec: &ToolSpec) -> Self {
        Self {
            name: spec.name.clone(),
            program: spec.program.clone(),
            script: spec.script.clone(),
            args: spec.args.clone(),
            timeout: spec.timeout(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the tool as `program [script] [args..] input [extra_args..]`
    pub async fn run(&self, input: &Path, extra_args: &[OsString]) -> RunResult {
        let mut cmd = tokio::process::Command::new(&self.program);
        if let Some(script) = &self.script {
            cmd.arg(script);
        }
        cmd.args(&self.args)
            .arg(input)
            .args(extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            "Running {} on {} (timeout {}s)",
            self.name,
            input.display(),
            self.timeout.as_secs()
        );

        let start = Instant::now();
        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => RunResult::completed(
                output.status.code(),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr),
                start.elapsed(),
            ),
            Ok(Err(e)) => {
                warn!("Failed to spawn {}: {}", self.program.display(), e);
                RunResult::failed(
                    RunFailure::SpawnFailed {
                        message: e.to_string(),
                    },
                    format!("fatal: failed to spawn {}: {}", self.program.display(), e),
                    start.elapsed(),
                )
            }
            Err(_) => {
                warn!(
                    "{} timed out after {}s on {}",
                    self.name,
                    self.timeout.as_secs(),
                    input.display()
                );
                RunResult::failed(
                    RunFailure::TimedOut {
                        after: self.timeout,
                    },
                    format!(
                        "fatal: {} timed out after {}s",
                        self.name,
                        self.timeout.as_secs()
                    ),
                    start.elapsed(),
                )
            }
        }
    }
}

/// Paths with a directory component must exist; bare names are searched on `PATH`
fn locate_program(program: &Path) -> Option<PathBuf> {
    which::which(program).ok()
}
