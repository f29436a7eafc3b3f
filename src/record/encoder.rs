// src/record/encoder.rs

//! Record rendering.
//!
//! Wire formats (one record per line):
//!
//! ```text
//! plain:      <seq>|<RFC3339 nanos>|<stream>|<raw line bytes>
//! plain (-t): <seq>|<stream>|<raw line bytes>
//! encrypted:  |e|<seq>|<stream>|<lowercase hex(nonce || ciphertext || tag)>
//! ```
//!
//! The leading `|e|` marks an encrypted record. `|p|` is reserved for a
//! plain-tagged variant; this encoder never produces it.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::crypto::CipherContext;
use crate::errors::Result;
use crate::record::LogRecord;
use crate::types::RecordFormat;

/// Turns records into the exact bytes appended to the sink, newline included.
#[derive(Debug)]
pub struct LineEncoder {
    cipher: Option<CipherContext>,
    timestamps: bool,
}

impl LineEncoder {
    pub fn plain(timestamps: bool) -> Self {
        Self {
            cipher: None,
            timestamps,
        }
    }

    pub fn encrypted(cipher: CipherContext) -> Self {
        Self {
            cipher: Some(cipher),
            timestamps: false,
        }
    }

    pub fn format(&self) -> RecordFormat {
        match self.cipher {
            Some(_) => RecordFormat::Encrypted,
            None => RecordFormat::Plain {
                timestamps: self.timestamps,
            },
        }
    }

    pub fn cipher(&self) -> Option<&CipherContext> {
        self.cipher.as_ref()
    }

    pub fn encode(&self, record: &LogRecord<'_>) -> Result<Vec<u8>> {
        self.encode_at(record, Utc::now())
    }

    /// Like [`encode`](Self::encode) with an explicit clock reading for the
    /// plain timestamp field.
    pub fn encode_at(&self, record: &LogRecord<'_>, now: DateTime<Utc>) -> Result<Vec<u8>> {
        match &self.cipher {
            Some(cipher) => {
                let blob = cipher.seal(record.payload)?;
                let mut out = format!("|e|{}|{}|", record.sequence, record.stream).into_bytes();
                out.reserve(blob.len() * 2 + 1);
                out.extend_from_slice(hex::encode(blob).as_bytes());
                out.push(b'\n');
                Ok(out)
            }
            None => {
                let header = if self.timestamps {
                    format!(
                        "{}|{}|{}|",
                        record.sequence,
                        now.to_rfc3339_opts(SecondsFormat::Nanos, true),
                        record.stream
                    )
                } else {
                    format!("{}|{}|", record.sequence, record.stream)
                };
                let mut out = header.into_bytes();
                out.reserve(record.payload.len() + 1);
                out.extend_from_slice(record.payload);
                out.push(b'\n');
                Ok(out)
            }
        }
    }
}
