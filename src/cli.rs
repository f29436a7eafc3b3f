// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{DEFAULT_JOB_NAME, DEFAULT_SHELL};

/// Command-line arguments for `bootstrap-runner`.
///
/// Everything after `<SCRIPT>` is handed to the script untouched, even if it
/// looks like one of our own flags.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bootstrap-runner",
    version,
    about = "Run a script in a working directory and re-emit its output as sequenced, encrypted records.",
    long_about = None
)]
pub struct CliArgs {
    /// Emit plain-text records instead of encrypting them.
    ///
    /// No key file is read in this mode.
    #[arg(long)]
    pub plain: bool,

    /// Omit the RFC 3339 timestamp field from plain records.
    #[arg(long)]
    pub no_timestamps: bool,

    /// Name used in the "started" / "completed" banner records.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_JOB_NAME)]
    pub job_name: String,

    /// Interpreter the script is run with.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SHELL)]
    pub shell: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BOOTSTRAP_RUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Directory the script runs in; must contain `keyfile` unless `--plain`.
    #[arg(value_name = "WORKING_DIRECTORY")]
    pub working_directory: PathBuf,

    /// Script passed to the interpreter, followed by its arguments.
    ///
    /// Arguments are forwarded verbatim.
    #[arg(
        value_name = "SCRIPT",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

impl CliArgs {
    /// The script and its arguments, split apart.
    pub fn script_and_args(&self) -> Option<(&String, &[String])> {
        self.command.split_first()
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The level as an `EnvFilter` directive.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
