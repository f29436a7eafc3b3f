// src/record/sink.rs

//! The single serialization point for the record stream.
//!
//! Both capturers and the supervisor write through one [`RecordSink`]. A
//! record's sequence number is reserved, the record encoded and its bytes
//! written and flushed while holding one `std::sync::Mutex`, so the order of
//! sequence numbers on the wire is exactly the order of writes.
//!
//! The sink closes itself after the end-of-stream sentinel or after any
//! failed emit; later emits are refused.

use std::io::Write;
use std::sync::Mutex;

use tracing::trace;

use crate::errors::{Result, RunnerError};
use crate::record::{LineEncoder, LogRecord, Sequencer, end_of_stream_payload};
use crate::types::StreamTag;

struct SinkState<W> {
    sequencer: Sequencer,
    writer: W,
    closed: bool,
}

pub struct RecordSink<W> {
    encoder: LineEncoder,
    state: Mutex<SinkState<W>>,
}

impl<W: Write> RecordSink<W> {
    pub fn new(encoder: LineEncoder, writer: W) -> Self {
        Self {
            encoder,
            state: Mutex::new(SinkState {
                sequencer: Sequencer::new(),
                writer,
                closed: false,
            }),
        }
    }

    pub fn encoder(&self) -> &LineEncoder {
        &self.encoder
    }

    /// Write one record and return its sequence number.
    pub fn emit(&self, stream: StreamTag, payload: &[u8]) -> Result<u64> {
        self.emit_inner(stream, payload, false)
    }

    /// Write the end-of-stream sentinel on the `debug` stream and close the
    /// sink in the same critical section. Succeeds at most once per sink.
    pub fn emit_end_of_stream(&self, exit_code: i32) -> Result<u64> {
        let payload = end_of_stream_payload(exit_code);
        self.emit_inner(StreamTag::Debug, payload.as_bytes(), true)
    }

    /// Number of sequence numbers handed out so far.
    pub fn records_emitted(&self) -> u64 {
        self.state
            .lock()
            .map(|s| s.sequencer.issued())
            .unwrap_or_default()
    }

    /// Refuse every later emit. Used when a fault elsewhere ends the run.
    pub fn close(&self) {
        match self.state.lock() {
            Ok(mut state) => state.closed = true,
            Err(poisoned) => poisoned.into_inner().closed = true,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(true)
    }

    /// Take the writer back, e.g. to inspect an in-memory buffer.
    pub fn into_inner(self) -> Result<W> {
        self.state
            .into_inner()
            .map(|s| s.writer)
            .map_err(|_| RunnerError::SinkPoisoned)
    }

    fn emit_inner(&self, stream: StreamTag, payload: &[u8], close: bool) -> Result<u64> {
        let mut state = self.state.lock().map_err(|_| RunnerError::SinkPoisoned)?;
        if state.closed {
            return Err(RunnerError::SinkClosed);
        }

        let sequence = state.sequencer.reserve();
        let result = self.write_locked(&mut state, sequence, stream, payload);
        if close || result.is_err() {
            state.closed = true;
        }
        result.map(|()| sequence)
    }

    fn write_locked(
        &self,
        state: &mut SinkState<W>,
        sequence: u64,
        stream: StreamTag,
        payload: &[u8],
    ) -> Result<()> {
        let bytes = self.encoder.encode(&LogRecord {
            sequence,
            stream,
            payload,
        })?;

        state
            .writer
            .write_all(&bytes)
            .and_then(|()| state.writer.flush())
            .map_err(|source| RunnerError::SinkWrite { sequence, source })?;

        trace!(sequence, %stream, len = payload.len(), "record written");
        Ok(())
    }
}
