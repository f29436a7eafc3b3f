// src/record/sequencer.rs

/// Monotonic record counter.
///
/// Not synchronized on its own: it lives inside the [`RecordSink`] lock so
/// that reserving number N and writing record N are one atomic step.
///
/// [`RecordSink`]: crate::record::RecordSink
#[derive(Debug)]
pub struct Sequencer {
    next: u64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Reserve the next sequence number. The first call returns 1.
    pub fn reserve(&mut self) -> u64 {
        let n = self.next;
        self.next += 1;
        n
    }

    /// How many numbers have been reserved so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}
