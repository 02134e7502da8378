//! Command-line front end: ingest a registration-number file, run the batch
//! processor against the echallan service, retry failures once, export.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::{bail, Context, Result};
use challan_core::build_registration_set;
use challan_engine::{
    write_export, ChannelProgressSink, FetchSettings, Processor, RunEvent, VahanFetcher,
};
use challan_logging::LogDestination;
use chrono::Local;
use log::info;

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    input: PathBuf,
    output_dir: PathBuf,
    batch_size: Option<usize>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliArgs> {
    let mut input = None;
    let mut output_dir = PathBuf::from("output");
    let mut batch_size = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--output-dir" => {
                let value = iter.next().context("--output-dir needs a value")?;
                output_dir = PathBuf::from(value);
            }
            "--batch-size" => {
                let value = iter.next().context("--batch-size needs a value")?;
                batch_size = Some(value.parse().context("--batch-size must be an integer")?);
            }
            _ if arg.starts_with("--") => bail!("unknown option {arg}"),
            _ => {
                if input.is_some() {
                    bail!("only one input file is supported");
                }
                input = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(CliArgs {
        input: input.context("usage: challan_app <input.csv> [--output-dir DIR] [--batch-size N]")?,
        output_dir,
        batch_size,
    })
}

/// Raw tokens from the identifier-bearing column of a delimited text file.
///
/// The column is picked by a fuzzy header match on "registration". A file
/// without such a header is treated as a headerless single-column list.
fn read_registration_column(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut lines = content.lines();
    let Some(first) = lines.next() else {
        bail!("input file {} is empty", path.display());
    };

    let header_column = first
        .split(',')
        .position(|cell| cell.trim().to_lowercase().contains("registration"));

    let tokens = match header_column {
        Some(index) => lines
            .filter_map(|line| line.split(',').nth(index))
            .map(str::to_string)
            .collect(),
        None => std::iter::once(first)
            .chain(lines)
            .filter_map(|line| line.split(',').next())
            .map(str::to_string)
            .collect(),
    };
    Ok(tokens)
}

fn spawn_progress_printer(event_rx: mpsc::Receiver<RunEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in event_rx {
            match event {
                RunEvent::BatchStarted { reg_nums } => {
                    info!("processing {}", reg_nums.join(", "));
                }
                RunEvent::BatchSettled {
                    processed,
                    total,
                    failed,
                } => {
                    info!("processed {processed}/{total} vehicles ({failed} errors)");
                }
                RunEvent::RunCompleted { report } => {
                    info!(
                        "run finished: {} succeeded, {} failed",
                        report.succeeded, report.failed
                    );
                }
                RunEvent::RetryCompleted { report } => {
                    info!(
                        "retry finished: {} recovered, {} still failed",
                        report.recovered, report.still_failed
                    );
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    challan_logging::initialize(LogDestination::Terminal, Path::new("."));
    let args = parse_args(std::env::args().skip(1))?;

    let raw_tokens = read_registration_column(&args.input)?;
    let regs = build_registration_set(&raw_tokens)?;
    info!(
        "loaded {} unique registration numbers from {}",
        regs.len(),
        args.input.display()
    );

    let fetcher = Arc::new(VahanFetcher::new(FetchSettings::default())?);
    let (event_tx, event_rx) = mpsc::channel();
    let processor = Processor::new(fetcher, Arc::new(ChannelProgressSink::new(event_tx)));
    let printer = spawn_progress_printer(event_rx);

    processor.load_registrations(regs);
    if let Some(size) = args.batch_size {
        processor.set_batch_size(size);
    }

    let Some(report) = processor.run().await else {
        bail!("nothing to process");
    };

    if report.failed > 0 {
        info!("retrying {} failed vehicles", report.failed);
        processor.retry_failed().await;
    }

    let data = processor.export_data();
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M").to_string();
    let summary = write_export(&data, &args.output_dir, &timestamp)?;
    info!(
        "exported {} challan rows to {}",
        summary.row_count,
        summary.rows_path.display()
    );

    // Dropping the processor closes the event channel and ends the printer.
    drop(processor);
    let _ = printer.join();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_and_overrides() {
        let parsed = parse_args(args(&["plates.csv"])).unwrap();
        assert_eq!(parsed.input, PathBuf::from("plates.csv"));
        assert_eq!(parsed.output_dir, PathBuf::from("output"));
        assert_eq!(parsed.batch_size, None);

        let parsed = parse_args(args(&[
            "plates.csv",
            "--batch-size",
            "5",
            "--output-dir",
            "out",
        ]))
        .unwrap();
        assert_eq!(parsed.batch_size, Some(5));
        assert_eq!(parsed.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn parse_args_rejects_missing_input() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["--wat"])).is_err());
    }

    #[test]
    fn reads_column_by_fuzzy_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Owner,Registration Number,Notes").unwrap();
        writeln!(file, "A,KA01AB1234,first").unwrap();
        writeln!(file, "B,MH12XY0001,second").unwrap();
        file.flush().unwrap();

        let tokens = read_registration_column(file.path()).unwrap();
        assert_eq!(tokens, vec!["KA01AB1234", "MH12XY0001"]);
    }

    #[test]
    fn reads_headerless_single_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "KA01AB1234").unwrap();
        writeln!(file, "MH12XY0001").unwrap();
        file.flush().unwrap();

        let tokens = read_registration_column(file.path()).unwrap();
        assert_eq!(tokens, vec!["KA01AB1234", "MH12XY0001"]);
    }
}
