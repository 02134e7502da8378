//! Challan core: pure run-state machine, ingestion and view-model helpers.
mod ingest;
mod outcome;
mod state;
mod view_model;

pub use ingest::{
    build_registration_set, dedupe_normalized, normalize_token, IngestError, MAX_PLAUSIBLE_LEN,
    MIN_PLAUSIBLE_LEN,
};
pub use outcome::{ChallanPayload, CitationRecord, LookupFailure, Outcome};
pub use state::{RunMode, RunState, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE, MIN_BATCH_SIZE};
pub use view_model::RunSnapshot;
