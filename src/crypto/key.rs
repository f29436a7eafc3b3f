// src/crypto/key.rs

//! Key provisioning.
//!
//! The orchestrator drops a base64-encoded key into the working directory
//! before launching the runner. It is read exactly once at startup; any
//! problem with it aborts the run before the child is spawned.

use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::crypto::cipher::CipherContext;
use crate::errors::{Result, RunnerError};

/// Name of the key file inside the working directory.
pub const KEY_FILE_NAME: &str = "keyfile";

/// Accepted raw key lengths (AES-128, AES-192, AES-256).
pub const VALID_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// Raw symmetric key material of a validated length.
#[derive(Clone, PartialEq, Eq)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if !VALID_KEY_LENGTHS.contains(&bytes.len()) {
            return Err(RunnerError::InvalidKeyLength(bytes.len()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

}

// Never print key material.
impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({} bytes)", self.0.len())
    }
}

/// Read and validate `<working_dir>/keyfile`.
///
/// Surrounding whitespace (e.g. a trailing newline left by `echo`) is ignored.
pub fn read_key_file(working_dir: &Path) -> Result<Key> {
    let path = working_dir.join(KEY_FILE_NAME);
    let contents = fs::read(&path).map_err(|source| RunnerError::KeyFileRead {
        path: path.clone(),
        source,
    })?;

    let decoded = STANDARD
        .decode(contents.trim_ascii())
        .map_err(|source| RunnerError::KeyEncoding {
            path: path.clone(),
            source,
        })?;

    let key = Key::from_bytes(decoded)?;
    debug!(path = ?path, key_len = key.as_bytes().len(), "loaded log encryption key");
    Ok(key)
}

/// Load the key from `working_dir` and build the cipher context from it.
pub fn load_cipher(working_dir: &Path) -> Result<CipherContext> {
    let key = read_key_file(working_dir)?;
    CipherContext::new(&key)
}
