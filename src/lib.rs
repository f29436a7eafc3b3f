// src/lib.rs

pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod record;
pub mod types;

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::RunnerConfig;
use crate::crypto::load_cipher;
use crate::errors::Result;
use crate::exec::Supervisor;
use crate::record::{LineEncoder, RecordSink};
use crate::types::RecordFormat;

/// High-level entry point used by `main.rs`.
///
/// Records go to this process's STDOUT. Returns the exit code the process
/// should terminate with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config = RunnerConfig::from_args(args)?;
    run_with_writer(config, std::io::stdout()).await
}

/// Run one supervised script, writing records to `writer`.
///
/// Key loading happens here, before anything is written, so a bad key
/// aborts the run with an empty record stream.
pub async fn run_with_writer<W>(config: RunnerConfig, writer: W) -> Result<i32>
where
    W: Write + Send + 'static,
{
    config.validate()?;
    let encoder = build_encoder(&config)?;
    info!(format = ?encoder.format(), "record encoder ready");

    let sink = Arc::new(RecordSink::new(encoder, writer));
    let supervisor = Supervisor::new(config, sink);
    let exit_code = supervisor.run().await?;

    debug!(
        records = supervisor.sink().records_emitted(),
        exit_code, "run finished"
    );
    Ok(exit_code)
}

/// Pick the line encoder for the configured format, loading the key file
/// from the working directory when encryption is on.
pub fn build_encoder(config: &RunnerConfig) -> Result<LineEncoder> {
    match config.format {
        RecordFormat::Encrypted => {
            let cipher = load_cipher(&config.working_dir)?;
            debug!(key_bits = cipher.key_bits(), "log encryption enabled");
            Ok(LineEncoder::encrypted(cipher))
        }
        RecordFormat::Plain { timestamps } => Ok(LineEncoder::plain(timestamps)),
    }
}
