use std::fmt;
use std::path::PathBuf;

/// Raw HTTP exchange; the status is not interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub final_url: String,
    pub bytes: Vec<u8>,
}

impl HttpResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Totals for one pass of the engine over a range of units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport<U> {
    pub stored: u64,
    pub absent: u64,
    pub skipped: u64,
    pub rate_limited: u64,
    pub retries: u64,
    /// Last unit resolved in this pass, if any.
    pub last: Option<U>,
}

impl<U> Default for CycleReport<U> {
    fn default() -> Self {
        Self {
            stored: 0,
            absent: 0,
            skipped: 0,
            rate_limited: 0,
            retries: 0,
            last: None,
        }
    }
}

impl<U> CycleReport<U> {
    pub fn processed(&self) -> u64 {
        self.stored + self.absent + self.skipped
    }
}

/// The engine stopped because a unit reported an unrecoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("feed halted at {unit}: {reason}")]
pub struct EngineHalt {
    pub unit: String,
    pub reason: String,
}

/// Where a payload ended up in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored {
    pub path: PathBuf,
    pub bytes: u64,
}
