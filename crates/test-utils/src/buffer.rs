//! In-memory record sink shared between the runner and the test.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use bootstrap_runner::crypto::CipherContext;
use bootstrap_runner::record::{decode_all, Decoded, DecodeError};

/// Cloneable `Write` target; every clone appends to the same buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Raw record lines, without their newline.
    pub fn lines(&self) -> Vec<Vec<u8>> {
        self.contents()
            .split(|b| *b == b'\n')
            .filter(|l| !l.is_empty())
            .map(|l| l.to_vec())
            .collect()
    }

    pub fn decode(&self, cipher: Option<&CipherContext>) -> Result<Vec<Decoded>, DecodeError> {
        decode_all(&self.contents(), cipher)
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Payloads as lossy strings, in record order.
pub fn payloads(records: &[Decoded]) -> Vec<String> {
    records
        .iter()
        .map(|d| String::from_utf8_lossy(&d.record().payload).into_owned())
        .collect()
}

/// Sequence numbers, in record order.
pub fn sequences(records: &[Decoded]) -> Vec<u64> {
    records.iter().map(|d| d.record().sequence).collect()
}
