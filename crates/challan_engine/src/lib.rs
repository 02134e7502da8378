//! Challan engine: remote lookup client, batch scheduler and export writer.
mod decode;
mod export;
mod fetch;
mod filename;
mod persist;
mod scheduler;
mod types;

pub use decode::{decode_envelope, DecodeError};
pub use export::{write_export, ExportData, ExportError, ExportSummary};
pub use fetch::{FetchSettings, Fetcher, VahanFetcher};
pub use filename::export_file_stem;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use scheduler::{ChannelProgressSink, NullProgressSink, Processor, ProgressSink};
pub use types::{LookupError, LookupErrorKind, RetryReport, RunEvent, RunReport};
