// src/record/mod.rs

//! The record stream written to STDOUT.
//!
//! - [`sequencer`] hands out gap-free ascending sequence numbers.
//! - [`encoder`] renders one record into its wire bytes (plain or encrypted).
//! - [`sink`] is the single serialization point: sequence assignment, encode
//!   and write happen under one lock.
//! - [`decoder`] is the consumer side of the same protocol.

pub mod decoder;
pub mod encoder;
pub mod sequencer;
pub mod sink;

pub use decoder::{DecodeError, Decoded, DecodedRecord, decode_all, decode_record};
pub use encoder::LineEncoder;
pub use sequencer::Sequencer;
pub use sink::RecordSink;

use crate::types::StreamTag;

/// Switches the consumer into verbose output for the following records.
pub const VERBOSE_MARKER: &str = "##octopus[stdout-verbose]";

/// Switches the consumer back to default output.
pub const DEFAULT_MARKER: &str = "##octopus[stdout-default]";

/// Fixed token identifying the end-of-stream sentinel.
pub const END_OF_STREAM_TOKEN: &str = "EOS-075CD4F0-8C76-491D-BA76-0879D35E9CFE";

/// Separates the token from the exit code in the sentinel payload.
pub const END_OF_STREAM_SEPARATOR: &str = "<<>>";

/// Sentinel payload: `EOS-<token><<>><exit code>`.
pub fn end_of_stream_payload(exit_code: i32) -> String {
    format!("{END_OF_STREAM_TOKEN}{END_OF_STREAM_SEPARATOR}{exit_code}")
}

/// One line of output on its way to the sink.
///
/// Records are transient: built, encoded, written and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub sequence: u64,
    pub stream: StreamTag,
    pub payload: &'a [u8],
}
