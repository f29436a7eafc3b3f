use std::fmt;
use std::str::FromStr;

/// Which descriptor a record is attributed to.
///
/// - `Stdout` / `Stderr`: lines captured from the child.
/// - `Debug`: control records that are not child output (the end-of-stream
///   sentinel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamTag {
    Stdout,
    Stderr,
    Debug,
}

impl StreamTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamTag::Stdout => "stdout",
            StreamTag::Stderr => "stderr",
            StreamTag::Debug => "debug",
        }
    }
}

impl fmt::Display for StreamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(StreamTag::Stdout),
            "stderr" => Ok(StreamTag::Stderr),
            "debug" => Ok(StreamTag::Debug),
            other => Err(format!(
                "invalid stream tag: {other} (expected \"stdout\", \"stderr\" or \"debug\")"
            )),
        }
    }
}

/// How the record stream is framed for one run.
///
/// Decided once at startup and never changes mid-stream, so a decoder can
/// rely on every record of a run sharing the same layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordFormat {
    /// `<seq>|<timestamp>|<stream>|<text>` or, without timestamps,
    /// `<seq>|<stream>|<text>`.
    Plain { timestamps: bool },
    /// `|e|<seq>|<stream>|<hex(nonce || ciphertext || tag)>`.
    #[default]
    Encrypted,
}

impl RecordFormat {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, RecordFormat::Encrypted)
    }
}
