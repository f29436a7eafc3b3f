#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bootstrap_runner::config::RunnerConfig;
use bootstrap_runner::crypto::{CipherContext, KEY_FILE_NAME, Key};
use bootstrap_runner::types::RecordFormat;
use rand::RngCore;
use tempfile::TempDir;

/// Builder for `RunnerConfig` to simplify test setup.
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    pub fn new(working_dir: &Path, script: &str) -> Self {
        Self {
            config: RunnerConfig::new(working_dir, script),
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.script_args.push(arg.to_string());
        self
    }

    pub fn plain(mut self, timestamps: bool) -> Self {
        self.config.format = RecordFormat::Plain { timestamps };
        self
    }

    pub fn job_name(mut self, name: &str) -> Self {
        self.config.job_name = name.to_string();
        self
    }

    pub fn shell(mut self, shell: &str) -> Self {
        self.config.shell = shell.to_string();
        self
    }

    pub fn build(self) -> RunnerConfig {
        self.config
    }
}

/// A throwaway working directory for one supervised run.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp workspace"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a random key of `len` bytes to the key file and return a cipher
    /// for decoding the run's output.
    pub fn with_random_key(&self, len: usize) -> CipherContext {
        let mut bytes = vec![0u8; len];
        rand::rng().fill_bytes(&mut bytes);
        self.write_keyfile(&STANDARD.encode(&bytes));
        let key = Key::from_bytes(bytes).expect("valid key length");
        CipherContext::new(&key).expect("cipher from valid key")
    }

    pub fn write_keyfile(&self, contents: &str) {
        fs::write(self.path().join(KEY_FILE_NAME), contents).expect("write keyfile");
    }

    /// Write an executable bash script into the workspace.
    pub fn write_script(&self, name: &str, body: &str) {
        let path = self.path().join(name);
        fs::write(&path, format!("#!/usr/bin/env bash\n{body}\n")).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
