use std::collections::BTreeMap;

use crate::outcome::{ChallanPayload, LookupFailure, Outcome};
use crate::view_model::RunSnapshot;

pub const MIN_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_BATCH_SIZE: usize = 2;

/// What the coordinator is currently doing. `Running` and `Retrying` are
/// mutually exclusive; every begin/settle transition checks this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Idle,
    Running,
    Retrying,
}

/// The single shared mutable resource of the coordinator.
///
/// All mutation happens through the methods below, at settle boundaries only:
/// start of a run or retry, start of a group, after a whole group settled, and
/// on finish/reset. Readers clone a [`RunSnapshot`] and never observe a
/// half-applied group.
#[derive(Debug, Clone)]
pub struct RunState {
    requested: Vec<String>,
    results: BTreeMap<String, Outcome>,
    errors: Vec<LookupFailure>,
    in_flight: Vec<String>,
    processed_count: usize,
    mode: RunMode,
    batch_size: usize,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            requested: Vec::new(),
            results: BTreeMap::new(),
            errors: Vec::new(),
            in_flight: Vec::new(),
            processed_count: 0,
            mode: RunMode::Idle,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    // Read accessors. Aggregates are computed on demand, never cached.

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    pub fn results(&self) -> &BTreeMap<String, Outcome> {
        &self.results
    }

    pub fn errors(&self) -> &[LookupFailure] {
        &self.errors
    }

    pub fn in_flight(&self) -> &[String] {
        &self.in_flight
    }

    pub fn processed_count(&self) -> usize {
        self.processed_count
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Registration numbers whose latest outcome is a failure, in error-list
    /// order. This is the retry target set.
    pub fn failed_registrations(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.reg_num.clone()).collect()
    }

    /// Vehicles with a successful lookup (an empty record set still counts).
    pub fn vehicles_with_data(&self) -> usize {
        self.results.values().filter(|o| o.is_success()).count()
    }

    pub fn pending_challans(&self) -> usize {
        self.success_payloads().map(|p| p.pending.len()).sum()
    }

    pub fn disposed_challans(&self) -> usize {
        self.success_payloads().map(|p| p.disposed.len()).sum()
    }

    /// Total challans found: sum of pending + disposed across all successful
    /// entries.
    pub fn total_challans(&self) -> usize {
        self.success_payloads().map(|p| p.record_count()).sum()
    }

    fn success_payloads(&self) -> impl Iterator<Item = &ChallanPayload> {
        self.results.values().filter_map(|o| match o {
            Outcome::Success(payload) => Some(payload),
            Outcome::Failure(_) => None,
        })
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            mode: self.mode,
            total_requested: self.requested.len(),
            processed_count: self.processed_count,
            in_flight: self.in_flight.clone(),
            vehicles_with_data: self.vehicles_with_data(),
            total_challans: self.total_challans(),
            pending_challans: self.pending_challans(),
            disposed_challans: self.disposed_challans(),
            errors: self.errors.clone(),
            batch_size: self.batch_size,
        }
    }

    // Transitions. Each returns whether it took effect; refusals are no-ops.

    /// Replace the registration set and drop all accumulated results.
    /// Refused while a run or retry is active.
    pub fn load_registrations(&mut self, regs: Vec<String>) -> bool {
        if self.mode != RunMode::Idle {
            return false;
        }
        self.requested = regs;
        self.clear_accumulated();
        true
    }

    /// Drop everything, including the registration set. Idle only.
    pub fn reset(&mut self) -> bool {
        if self.mode != RunMode::Idle {
            return false;
        }
        self.requested.clear();
        self.clear_accumulated();
        true
    }

    /// Clamp into the configured range; a zero or negative request becomes the
    /// minimum rather than looping forever downstream. Idle only.
    pub fn set_batch_size(&mut self, size: usize) -> bool {
        if self.mode != RunMode::Idle {
            return false;
        }
        self.batch_size = size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE);
        true
    }

    /// Enter `Running` with fresh accounting. Refused when a run or retry is
    /// active, or when there is nothing to process.
    pub fn begin_run(&mut self) -> bool {
        if self.mode != RunMode::Idle || self.requested.is_empty() {
            return false;
        }
        self.clear_accumulated();
        self.mode = RunMode::Running;
        true
    }

    /// Enter `Retrying` for `targets`, removing their error entries so that an
    /// identifier is never listed as both in-flight and failed.
    pub fn begin_retry(&mut self, targets: &[String]) -> bool {
        if self.mode != RunMode::Idle || targets.is_empty() {
            return false;
        }
        self.errors.retain(|e| !targets.contains(&e.reg_num));
        self.mode = RunMode::Retrying;
        true
    }

    /// Mark one group as the currently-processing set.
    pub fn begin_batch(&mut self, group: &[String]) {
        debug_assert!(self.in_flight.is_empty(), "previous group never settled");
        self.in_flight = group.to_vec();
    }

    /// Record one settled lookup. The newest outcome replaces any prior entry,
    /// and a stale error entry for this vehicle is removed before a failure is
    /// re-recorded, so the error list never holds duplicates.
    pub fn apply_outcome(&mut self, reg_num: &str, outcome: Outcome) {
        self.errors.retain(|e| e.reg_num != reg_num);
        if let Outcome::Failure(message) = &outcome {
            self.errors.push(LookupFailure {
                reg_num: reg_num.to_string(),
                message: message.clone(),
            });
        }
        self.results.insert(reg_num.to_string(), outcome);
    }

    /// Close out the current group. `processed_count` advances by the whole
    /// group size in one step, and only during a main run: retry targets were
    /// already counted the first time around, which keeps
    /// `results.len() == processed_count` at idle after a full run.
    pub fn settle_batch(&mut self) {
        let size = self.in_flight.len();
        self.in_flight.clear();
        if self.mode == RunMode::Running {
            self.processed_count += size;
        }
    }

    /// Return to `Idle`, dropping any in-flight marker. Accumulated results
    /// stay intact; this is also the recovery path when the scheduler loop
    /// unwinds.
    pub fn finish(&mut self) {
        self.in_flight.clear();
        self.mode = RunMode::Idle;
    }

    fn clear_accumulated(&mut self) {
        self.results.clear();
        self.errors.clear();
        self.in_flight.clear();
        self.processed_count = 0;
    }
}
