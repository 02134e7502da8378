use std::fmt;

/// Why a single lookup attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupErrorKind {
    /// The endpoint answered with a non-success HTTP status.
    HttpStatus(u16),
    /// The request never produced a usable response (connect, timeout, TLS).
    Transport,
    /// The body was not the expected envelope, or carried an error status.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupError {
    pub kind: LookupErrorKind,
    pub message: String,
}

impl LookupError {
    pub(crate) fn new(kind: LookupErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn http_status(code: u16) -> Self {
        Self::new(LookupErrorKind::HttpStatus(code), code.to_string())
    }
}

// The rendered form is what lands in the user-visible error list.
impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LookupErrorKind::HttpStatus(code) => write!(f, "API error: {code}"),
            LookupErrorKind::Malformed => write!(f, "Failed to fetch challan data"),
            LookupErrorKind::Transport => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for LookupError {}

/// Counts for one completed main run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Counts for one completed retry, measured against the failed set captured
/// before resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryReport {
    pub attempted: usize,
    pub recovered: usize,
    pub still_failed: usize,
}

impl RetryReport {
    pub fn all_recovered(&self) -> bool {
        self.still_failed == 0
    }
}

/// Progress notifications, emitted only at group boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    BatchStarted {
        reg_nums: Vec<String>,
    },
    BatchSettled {
        processed: usize,
        total: usize,
        failed: usize,
    },
    RunCompleted {
        report: RunReport,
    },
    RetryCompleted {
        report: RetryReport,
    },
}
