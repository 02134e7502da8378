use crate::{LookupFailure, RunMode};

/// Owned, point-in-time view of the run for progress display.
///
/// Mid-run snapshots are expected and valid: partially populated results,
/// a non-empty `in_flight` set, `processed_count` short of the total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    pub mode: RunMode,
    pub total_requested: usize,
    pub processed_count: usize,
    pub in_flight: Vec<String>,
    pub vehicles_with_data: usize,
    pub total_challans: usize,
    pub pending_challans: usize,
    pub disposed_challans: usize,
    pub errors: Vec<LookupFailure>,
    pub batch_size: usize,
}

impl RunSnapshot {
    pub fn is_busy(&self) -> bool {
        self.mode != RunMode::Idle
    }

    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }
}
