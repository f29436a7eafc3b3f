// src/errors.rs

//! Crate-wide error type.
//!
//! Every variant here is fatal to the run. Faults that only degrade the run
//! (a failed wait on the child) are logged and folded into the exit code by
//! the supervisor instead of being returned.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::StreamTag;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("invalid working directory {path:?}: {reason}")]
    WorkingDirectory { path: PathBuf, reason: String },

    #[error("no script to run")]
    MissingScript,

    #[error("failed to read key file {path:?}: {source}")]
    KeyFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("key file {path:?} is not valid base64: {source}")]
    KeyEncoding {
        path: PathBuf,
        #[source]
        source: base64::DecodeError,
    },

    #[error("invalid key size: {0} bytes. Key must be 16, 24, or 32 bytes")]
    InvalidKeyLength(usize),

    #[error("failed to generate nonce: {0}")]
    Entropy(String),

    #[error("failed to seal record payload")]
    Encryption,

    #[error("failed to write record {sequence} to the output sink: {source}")]
    SinkWrite {
        sequence: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("record sink lock poisoned")]
    SinkPoisoned,

    #[error("record sink is closed; no further records may be written")]
    SinkClosed,

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("child {0} pipe was not captured")]
    MissingPipe(StreamTag),

    #[error("failed to read child {stream}: {source}")]
    StreamRead {
        stream: StreamTag,
        #[source]
        source: std::io::Error,
    },

    #[error("stream capture task failed: {0}")]
    CaptureTask(String),
}

impl RunnerError {
    /// Faults that abort the run before any child process exists.
    pub fn is_pre_spawn(&self) -> bool {
        matches!(
            self,
            RunnerError::WorkingDirectory { .. }
                | RunnerError::MissingScript
                | RunnerError::KeyFileRead { .. }
                | RunnerError::KeyEncoding { .. }
                | RunnerError::InvalidKeyLength(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
