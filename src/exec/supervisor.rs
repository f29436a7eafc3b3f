// src/exec/supervisor.rs

//! Child lifecycle.
//!
//! ```text
//! ChildSpawning -> ChildRunning -> DrainingStreams -> ChildExited -> Finalizing -> Done
//! ```
//!
//! (`Init` and `KeyLoaded` happen before a `Supervisor` exists; see
//! [`crate::run_with_writer`].)
//!
//! The exit code is only read after both capturers have hit EOF, so every
//! line the child wrote is in the record stream before the sentinel.

use std::fmt;
use std::io::Write;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::RunnerConfig;
use crate::errors::{Result, RunnerError};
use crate::exec::capture::capture_blocking;
use crate::record::{DEFAULT_MARKER, RecordSink, VERBOSE_MARKER};
use crate::types::StreamTag;

/// Exit code used when the child's status could not be determined.
pub const UNKNOWN_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ChildSpawning,
    ChildRunning,
    DrainingStreams,
    ChildExited,
    Finalizing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ChildSpawning => "child-spawning",
            Phase::ChildRunning => "child-running",
            Phase::DrainingStreams => "draining-streams",
            Phase::ChildExited => "child-exited",
            Phase::Finalizing => "finalizing",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

pub struct Supervisor<W> {
    config: RunnerConfig,
    sink: Arc<RecordSink<W>>,
}

impl<W> Supervisor<W>
where
    W: Write + Send + 'static,
{
    pub fn new(config: RunnerConfig, sink: Arc<RecordSink<W>>) -> Self {
        Self { config, sink }
    }

    pub fn sink(&self) -> &Arc<RecordSink<W>> {
        &self.sink
    }

    /// Run the child to completion and return the exit code to propagate.
    ///
    /// Returns `Err` only for fatal faults (spawn failure, stream read
    /// failure, sink failure). A failed wait on the child is logged and
    /// reported as [`UNKNOWN_EXIT_CODE`].
    pub async fn run(&self) -> Result<i32> {
        self.enter(Phase::ChildSpawning);
        let mut command = self.command();

        // Banner goes out first so it always precedes child output.
        self.emit_banner(&self.config.started_message())?;

        let mut child = command.spawn().map_err(|source| RunnerError::Spawn {
            program: self.config.shell.clone(),
            source,
        })?;

        self.enter(Phase::ChildRunning);
        info!(
            pid = child.id(),
            script = %self.config.script,
            dir = ?self.config.working_dir,
            "child process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or(RunnerError::MissingPipe(StreamTag::Stdout))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(RunnerError::MissingPipe(StreamTag::Stderr))?;

        // One blocking-pool thread per stream.
        let mut capturers = JoinSet::new();
        let (handle, sink) = (Handle::current(), Arc::clone(&self.sink));
        capturers.spawn_blocking(move || {
            capture_blocking(handle, stdout, StreamTag::Stdout, sink)
        });
        let (handle, sink) = (Handle::current(), Arc::clone(&self.sink));
        capturers.spawn_blocking(move || {
            capture_blocking(handle, stderr, StreamTag::Stderr, sink)
        });

        self.enter(Phase::DrainingStreams);
        let mut lines = 0u64;
        while let Some(joined) = capturers.join_next().await {
            let captured = joined
                .map_err(|e| RunnerError::CaptureTask(e.to_string()))
                .and_then(|r| r);
            match captured {
                Ok(n) => lines += n,
                Err(e) => {
                    self.sink.close();
                    return Err(e);
                }
            }
        }
        debug!(lines, "both streams drained");

        let exit_code = match child.wait().await {
            Ok(status) => exit_code_of(status),
            Err(e) => {
                error!(error = %e, "failed to wait for bootstrap script");
                UNKNOWN_EXIT_CODE
            }
        };
        self.enter(Phase::ChildExited);
        info!(exit_code, "child process exited");

        self.enter(Phase::Finalizing);
        self.emit_banner(&self.config.completed_message())?;
        let sequence = self.sink.emit_end_of_stream(exit_code)?;
        debug!(sequence, exit_code, "end of stream written");

        self.enter(Phase::Done);
        Ok(exit_code)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.shell);
        cmd.arg(&self.config.script)
            .args(&self.config.script_args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Verbose marker, human-readable message, default marker.
    fn emit_banner(&self, message: &str) -> Result<()> {
        for line in [VERBOSE_MARKER, message, DEFAULT_MARKER] {
            self.sink.emit(StreamTag::Stdout, line.as_bytes())?;
        }
        Ok(())
    }

    fn enter(&self, phase: Phase) {
        debug!(%phase, "supervisor phase");
    }
}

/// Exit code to report for a finished child.
///
/// A child killed by a signal reports `128 + signal`, as a shell would.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    UNKNOWN_EXIT_CODE
}
