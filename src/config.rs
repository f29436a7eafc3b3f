// src/config.rs

//! Run configuration, resolved once from the command line.

use std::fs;
use std::path::PathBuf;

use crate::cli::CliArgs;
use crate::errors::{Result, RunnerError};
use crate::types::RecordFormat;

/// Subject of the start/completion banners.
pub const DEFAULT_JOB_NAME: &str = "Kubernetes Script Pod";

/// Interpreter used to run the script.
pub const DEFAULT_SHELL: &str = "bash";

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory the child runs in; also where the key file lives.
    pub working_dir: PathBuf,
    pub script: String,
    pub script_args: Vec<String>,
    pub shell: String,
    pub format: RecordFormat,
    pub job_name: String,
}

impl RunnerConfig {
    /// Encrypted run of `script` in `working_dir` with default settings.
    pub fn new(working_dir: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
            script: script.into(),
            script_args: Vec::new(),
            shell: DEFAULT_SHELL.to_string(),
            format: RecordFormat::Encrypted,
            job_name: DEFAULT_JOB_NAME.to_string(),
        }
    }

    /// Build from parsed arguments. The working directory is checked later,
    /// by [`validate`](Self::validate), when the run starts.
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let format = if args.plain {
            RecordFormat::Plain {
                timestamps: !args.no_timestamps,
            }
        } else {
            RecordFormat::Encrypted
        };

        let (script, script_args) = match args.script_and_args() {
            Some((script, rest)) => (script.clone(), rest.to_vec()),
            None => return Err(RunnerError::MissingScript),
        };

        Ok(Self {
            working_dir: args.working_directory,
            script,
            script_args,
            shell: args.shell,
            format,
            job_name: args.job_name,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| RunnerError::WorkingDirectory {
            path: self.working_dir.clone(),
            reason,
        };

        let meta = fs::metadata(&self.working_dir).map_err(|e| invalid(e.to_string()))?;
        if !meta.is_dir() {
            return Err(invalid("not a directory".to_string()));
        }
        Ok(())
    }

    pub fn started_message(&self) -> String {
        format!("{} started", self.job_name)
    }

    pub fn completed_message(&self) -> String {
        format!("{} completed", self.job_name)
    }
}
