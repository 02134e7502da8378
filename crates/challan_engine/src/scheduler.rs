use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use challan_core::{Outcome, RunMode, RunSnapshot, RunState};
use futures_util::future::join_all;
use log::{info, warn};

use crate::export::ExportData;
use crate::fetch::Fetcher;
use crate::types::{RetryReport, RunEvent, RunReport};

/// Observer boundary: receives [`RunEvent`]s at group boundaries only, never
/// mid-group.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

/// Forwards events over a channel, for a UI or logging thread to drain.
pub struct ChannelProgressSink {
    tx: mpsc::Sender<RunEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<RunEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: RunEvent) {
        let _ = self.tx.send(event);
    }
}

/// Drops every event.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: RunEvent) {}
}

/// Batch processing and retry coordinator.
///
/// Owns the shared [`RunState`] and is the only writer to it. Lookups for one
/// group run concurrently (fan-out capped at the batch size) and the group
/// settles as a whole before the next group starts, so counters only ever
/// advance in whole-group steps and no vehicle is in flight twice.
pub struct Processor {
    state: Arc<Mutex<RunState>>,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn ProgressSink>,
}

impl Processor {
    pub fn new(fetcher: Arc<dyn Fetcher>, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RunState::new())),
            fetcher,
            sink,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        // A reader that panicked while holding the lock must not wedge the
        // coordinator; the state is only ever mutated at settle points, so
        // the inner value is still coherent.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the registration set. Refused (returns false) while busy.
    pub fn load_registrations(&self, regs: Vec<String>) -> bool {
        self.lock().load_registrations(regs)
    }

    /// Drop all state including the registration set. Refused while busy.
    pub fn reset(&self) -> bool {
        self.lock().reset()
    }

    /// Adjust the group size (clamped to 1..=100). Refused while busy.
    pub fn set_batch_size(&self, size: usize) -> bool {
        self.lock().set_batch_size(size)
    }

    /// Point-in-time view, valid to take mid-run.
    pub fn snapshot(&self) -> RunSnapshot {
        self.lock().snapshot()
    }

    /// Clone what the export collaborator needs. Safe mid-run; a partial
    /// export simply sees the groups that have settled so far.
    pub fn export_data(&self) -> ExportData {
        let state = self.lock();
        ExportData {
            total_requested: state.requested().len(),
            in_progress: state.mode() != RunMode::Idle,
            results: state.results().clone(),
            errors: state.errors().to_vec(),
        }
    }

    /// Process the whole registration set, group by group.
    ///
    /// Returns `None` without touching state when a run or retry is already
    /// active or the set is empty. Accounting (`results`, errors,
    /// `processed_count`) starts fresh on every run.
    pub async fn run(&self) -> Option<RunReport> {
        let (targets, batch_size) = {
            let mut state = self.lock();
            if !state.begin_run() {
                return None;
            }
            (state.requested().to_vec(), state.batch_size())
        };

        info!(
            "run started: {} vehicles, batch size {}",
            targets.len(),
            batch_size
        );
        let guard = ModeGuard::new(Arc::clone(&self.state));
        self.process_groups(&targets, batch_size).await;

        let report = {
            let state = self.lock();
            RunReport {
                requested: targets.len(),
                succeeded: state.vehicles_with_data(),
                failed: state.errors().len(),
            }
        };
        drop(guard);

        info!(
            "run complete: processed {} vehicles with {} errors",
            report.requested, report.failed
        );
        self.sink.emit(RunEvent::RunCompleted { report });
        Some(report)
    }

    /// Resubmit every currently-failed vehicle through the same group loop.
    ///
    /// Returns `None` when busy or when there is nothing to retry.
    pub async fn retry_failed(&self) -> Option<RetryReport> {
        let (targets, batch_size) = {
            let mut state = self.lock();
            // Capture the failed set before resubmission; the completion
            // tally compares against this, never against the live list.
            let targets = state.failed_registrations();
            if !state.begin_retry(&targets) {
                return None;
            }
            let batch_size = state.batch_size();
            (targets, batch_size)
        };
        let failing = targets.clone();
        Some(self.finish_retry(targets, failing, batch_size).await)
    }

    /// Resubmit one vehicle as a singleton group. Refused for registrations
    /// outside the loaded set; the store only ever holds requested vehicles.
    /// A vehicle that is not currently failing may still be resubmitted, but
    /// the report only tallies vehicles that were.
    pub async fn retry_one(&self, reg_num: &str) -> Option<RetryReport> {
        let target = vec![reg_num.to_string()];
        let failing = {
            let mut state = self.lock();
            if !state.requested().contains(&target[0]) {
                return None;
            }
            let failing: Vec<String> = state
                .failed_registrations()
                .into_iter()
                .filter(|reg| *reg == target[0])
                .collect();
            if !state.begin_retry(&target) {
                return None;
            }
            failing
        };
        Some(self.finish_retry(target, failing, 1).await)
    }

    /// `failing` is the subset of `targets` that had an error before the
    /// retry began; the report speaks only about those vehicles.
    async fn finish_retry(
        &self,
        targets: Vec<String>,
        failing: Vec<String>,
        batch_size: usize,
    ) -> RetryReport {
        let guard = ModeGuard::new(Arc::clone(&self.state));
        self.process_groups(&targets, batch_size).await;

        let report = {
            let state = self.lock();
            let still_failed = state
                .errors()
                .iter()
                .filter(|e| failing.contains(&e.reg_num))
                .count();
            RetryReport {
                attempted: failing.len(),
                recovered: failing.len() - still_failed,
                still_failed,
            }
        };
        drop(guard);

        if report.all_recovered() {
            info!("retry complete: all {} vehicles recovered", report.attempted);
        } else {
            info!(
                "retry complete: {} recovered, {} still failed",
                report.recovered, report.still_failed
            );
        }
        self.sink.emit(RunEvent::RetryCompleted { report });
        report
    }

    /// The group loop shared by runs and retries. Strictly sequential over
    /// groups; concurrent only within one group.
    async fn process_groups(&self, targets: &[String], batch_size: usize) {
        for group in targets.chunks(batch_size.max(1)) {
            self.lock().begin_batch(group);
            self.sink.emit(RunEvent::BatchStarted {
                reg_nums: group.to_vec(),
            });

            let lookups = group.iter().map(|reg_num| {
                let fetcher = Arc::clone(&self.fetcher);
                async move {
                    let outcome = match fetcher.fetch(reg_num).await {
                        Ok(payload) => Outcome::Success(payload),
                        Err(err) => {
                            warn!("lookup failed for {reg_num}: {err}");
                            Outcome::Failure(err.to_string())
                        }
                    };
                    (reg_num.clone(), outcome)
                }
            });
            // The whole group settles before anything is applied; the slowest
            // member gates progress to the next group.
            let settled = join_all(lookups).await;

            let (processed, total, failed) = {
                let mut state = self.lock();
                for (reg_num, outcome) in settled {
                    state.apply_outcome(&reg_num, outcome);
                }
                state.settle_batch();
                (
                    state.processed_count(),
                    state.requested().len(),
                    state.errors().len(),
                )
            };
            self.sink.emit(RunEvent::BatchSettled {
                processed,
                total,
                failed,
            });
        }
    }
}

/// Puts the state back to Idle when the orchestration scope exits, including
/// on unwind, so a panicking loop can never leave the mode stuck.
struct ModeGuard {
    state: Arc<Mutex<RunState>>,
}

impl ModeGuard {
    fn new(state: Arc<Mutex<RunState>>) -> Self {
        Self { state }
    }
}

impl Drop for ModeGuard {
    fn drop(&mut self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.finish();
    }
}
