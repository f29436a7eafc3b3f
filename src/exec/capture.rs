// src/exec/capture.rs

//! Per-stream line capture.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::runtime::Handle;
use tracing::{debug, error};

use crate::errors::{Result, RunnerError};
use crate::record::RecordSink;
use crate::types::StreamTag;

/// Read `source` line by line until EOF, emitting every line as a record
/// tagged `stream`. Returns the number of lines forwarded.
///
/// Lines are raw bytes split on `\n`; a trailing `\r` is dropped and a final
/// unterminated line is still emitted. Any read error other than EOF is
/// fatal to the run and closes `sink`.
pub async fn capture_stream<R, W>(
    source: R,
    stream: StreamTag,
    sink: Arc<RecordSink<W>>,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut reader = BufReader::new(source);
    let mut line = Vec::new();
    let mut count = 0u64;

    loop {
        line.clear();
        let n = match reader.read_until(b'\n', &mut line).await {
            Ok(n) => n,
            Err(source) => {
                error!(%stream, error = %source, "failed to read child stream");
                sink.close();
                return Err(RunnerError::StreamRead { stream, source });
            }
        };
        if n == 0 {
            break;
        }

        sink.emit(stream, trim_line_ending(&line))?;
        count += 1;
    }

    debug!(%stream, lines = count, "stream drained");
    Ok(count)
}

/// Run [`capture_stream`] to completion on the calling thread.
///
/// Called from `spawn_blocking`, so each stream gets its own OS thread and a
/// sink write stuck on a full stdout pipe parks only that thread, never a
/// runtime worker.
pub fn capture_blocking<R, W>(
    handle: Handle,
    source: R,
    stream: StreamTag,
    sink: Arc<RecordSink<W>>,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    handle.block_on(capture_stream(source, stream, sink))
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
