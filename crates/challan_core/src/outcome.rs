use serde::Serialize;
use serde_json::Value;

/// One citation record as returned by the remote service. The core never
/// interprets its fields beyond counting, so it stays an opaque JSON object.
pub type CitationRecord = Value;

/// Citation records for one vehicle, split by disposal status.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChallanPayload {
    pub pending: Vec<CitationRecord>,
    pub disposed: Vec<CitationRecord>,
}

impl ChallanPayload {
    /// The explicit no-records response maps to this, not to a failure.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.pending.len() + self.disposed.len()
    }
}

/// Result of the most recent lookup attempt for one registration number.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(ChallanPayload),
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}

/// One entry in the user-visible error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupFailure {
    pub reg_num: String,
    pub message: String,
}
