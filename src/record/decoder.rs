// src/record/decoder.rs

//! Parser for the record stream, as run by the consuming agent.
//!
//! Accepted layouts:
//!
//! ```text
//! |e|<seq>|<stream>|<hex blob>          encrypted
//! |p|<seq>|<stream>|<text>              plain, explicitly tagged
//! <seq>|<timestamp>|<stream>|<text>     plain
//! <seq>|<stream>|<text>                 plain, no timestamp
//! ```
//!
//! The payload is everything after the last framing `|`, so it may itself
//! contain pipes.

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::crypto::CipherContext;
use crate::record::{END_OF_STREAM_SEPARATOR, END_OF_STREAM_TOKEN};
use crate::types::StreamTag;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record is not correctly pipe delimited: {0}")]
    NotDelimited(String),

    #[error("unknown record mode '{mode}': {line}")]
    UnknownMode { mode: String, line: String },

    #[error("invalid line number in record: {0}")]
    InvalidSequence(String),

    #[error("invalid log timestamp in record: {0}")]
    InvalidTimestamp(String),

    #[error("invalid stream tag in record: {0}")]
    InvalidStream(String),

    #[error("encrypted payload is not valid hex in record {0}")]
    InvalidHex(u64),

    #[error("record {0} is encrypted but no key was supplied")]
    MissingCipher(u64),

    #[error("record {0} failed authentication")]
    Authentication(u64),

    #[error("invalid end of stream record: {0}")]
    InvalidEndOfStream(String),
}

/// One parsed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    pub sequence: u64,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub stream: StreamTag,
    pub payload: Vec<u8>,
    pub encrypted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Line(DecodedRecord),
    /// The sentinel: no further records follow for this run.
    EndOfStream { record: DecodedRecord, exit_code: i32 },
}

impl Decoded {
    pub fn record(&self) -> &DecodedRecord {
        match self {
            Decoded::Line(record) => record,
            Decoded::EndOfStream { record, .. } => record,
        }
    }
}

/// Parse one record line (a trailing `\n` is ignored).
pub fn decode_record(line: &[u8], cipher: Option<&CipherContext>) -> Result<Decoded, DecodeError> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let lossy = || String::from_utf8_lossy(line).into_owned();

    let record = if let Some(rest) = line.strip_prefix(b"|") {
        let parts: Vec<&[u8]> = rest.splitn(4, |b| *b == b'|').collect();
        let [mode, seq, stream, body] = parts[..] else {
            return Err(DecodeError::NotDelimited(lossy()));
        };

        let sequence = parse_sequence(seq).ok_or_else(|| DecodeError::InvalidSequence(lossy()))?;
        let stream = parse_stream(stream).ok_or_else(|| DecodeError::InvalidStream(lossy()))?;

        match mode {
            b"e" => {
                let cipher = cipher.ok_or(DecodeError::MissingCipher(sequence))?;
                let blob = hex::decode(body).map_err(|_| DecodeError::InvalidHex(sequence))?;
                let payload = cipher
                    .open(&blob)
                    .map_err(|_| DecodeError::Authentication(sequence))?;
                DecodedRecord {
                    sequence,
                    timestamp: None,
                    stream,
                    payload,
                    encrypted: true,
                }
            }
            b"p" => DecodedRecord {
                sequence,
                timestamp: None,
                stream,
                payload: body.to_vec(),
                encrypted: false,
            },
            other => {
                return Err(DecodeError::UnknownMode {
                    mode: String::from_utf8_lossy(other).into_owned(),
                    line: lossy(),
                });
            }
        }
    } else {
        let parts: Vec<&[u8]> = line.splitn(3, |b| *b == b'|').collect();
        let [seq, second, rest] = parts[..] else {
            return Err(DecodeError::NotDelimited(lossy()));
        };

        let sequence = parse_sequence(seq).ok_or_else(|| DecodeError::InvalidSequence(lossy()))?;

        let (timestamp, stream, body) = match parse_stream(second) {
            Some(stream) => (None, stream, rest),
            None => {
                let timestamp = std::str::from_utf8(second)
                    .ok()
                    .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
                    .ok_or_else(|| DecodeError::InvalidTimestamp(lossy()))?;

                let parts: Vec<&[u8]> = rest.splitn(2, |b| *b == b'|').collect();
                let [stream, body] = parts[..] else {
                    return Err(DecodeError::NotDelimited(lossy()));
                };
                let stream =
                    parse_stream(stream).ok_or_else(|| DecodeError::InvalidStream(lossy()))?;
                (Some(timestamp), stream, body)
            }
        };

        DecodedRecord {
            sequence,
            timestamp,
            stream,
            payload: body.to_vec(),
            encrypted: false,
        }
    };

    classify(record)
}

/// Decode a whole captured stream, one record per line.
pub fn decode_all(stream: &[u8], cipher: Option<&CipherContext>) -> Result<Vec<Decoded>, DecodeError> {
    stream
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| decode_record(line, cipher))
        .collect()
}

fn classify(record: DecodedRecord) -> Result<Decoded, DecodeError> {
    let Some(rest) = record.payload.strip_prefix(END_OF_STREAM_TOKEN.as_bytes()) else {
        return Ok(Decoded::Line(record));
    };

    let invalid = || DecodeError::InvalidEndOfStream(String::from_utf8_lossy(&record.payload).into_owned());

    if record.stream != StreamTag::Debug {
        return Err(invalid());
    }

    let exit_code = rest
        .strip_prefix(END_OF_STREAM_SEPARATOR.as_bytes())
        .and_then(|code| std::str::from_utf8(code).ok())
        .and_then(|code| code.parse::<i32>().ok())
        .ok_or_else(invalid)?;

    Ok(Decoded::EndOfStream { record, exit_code })
}

fn parse_sequence(field: &[u8]) -> Option<u64> {
    std::str::from_utf8(field).ok()?.parse().ok()
}

fn parse_stream(field: &[u8]) -> Option<StreamTag> {
    std::str::from_utf8(field).ok()?.parse().ok()
}
