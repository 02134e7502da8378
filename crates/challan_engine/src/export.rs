use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use challan_core::{LookupFailure, Outcome};
use serde_json::{json, Map, Value};

use crate::filename::export_file_stem;
use crate::persist::{AtomicFileWriter, PersistError};

/// Everything the export needs, cloned out of the result store so writing
/// never holds the coordinator's lock. A mid-run clone produces a partial
/// export, which is a supported mode.
#[derive(Debug, Clone)]
pub struct ExportData {
    pub total_requested: usize,
    pub in_progress: bool,
    pub results: BTreeMap<String, Outcome>,
    pub errors: Vec<LookupFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows_path: PathBuf,
    pub summary_path: PathBuf,
    pub row_count: usize,
    pub pending_rows: usize,
    pub disposed_rows: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no results to export")]
    Empty,
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Write the flattened citation rows and the run summary as two JSON
/// documents under `output_dir`, named
/// `challan_data_{complete|partial}_{n}vehicles_{timestamp}_{rows|summary}.json`.
pub fn write_export(
    data: &ExportData,
    output_dir: &Path,
    timestamp: &str,
) -> Result<ExportSummary, ExportError> {
    if data.results.is_empty() {
        return Err(ExportError::Empty);
    }

    let rows = flatten_rows(&data.results);
    let pending_rows = count_status(&rows, "Pending");
    let disposed_rows = count_status(&rows, "Disposed");

    let succeeded: Vec<&String> = data
        .results
        .iter()
        .filter(|(_, outcome)| outcome.is_success())
        .map(|(reg_num, _)| reg_num)
        .collect();

    let summary = json!({
        "export_date": timestamp,
        "export_status": if data.in_progress { "Partial (Processing ongoing)" } else { "Complete" },
        "total_vehicles_requested": data.total_requested,
        "total_vehicles_succeeded": succeeded.len(),
        "total_vehicles_failed": data.errors.len(),
        "total_challans_found": rows.len(),
        "pending_challans": pending_rows,
        "disposed_challans": disposed_rows,
        "succeeded_vehicles": &succeeded,
        "failed_vehicles": &data.errors,
    });

    let stem = export_file_stem(!data.in_progress, succeeded.len(), timestamp);
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let rows_path = writer.write(
        &format!("{stem}_rows.json"),
        &serde_json::to_string_pretty(&rows)?,
    )?;
    let summary_path = writer.write(
        &format!("{stem}_summary.json"),
        &serde_json::to_string_pretty(&summary)?,
    )?;

    Ok(ExportSummary {
        rows_path,
        summary_path,
        row_count: rows.len(),
        pending_rows,
        disposed_rows,
    })
}

fn count_status(rows: &[Value], status: &str) -> usize {
    rows.iter()
        .filter(|row| row.get("status").and_then(Value::as_str) == Some(status))
        .count()
}

fn flatten_rows(results: &BTreeMap<String, Outcome>) -> Vec<Value> {
    let mut rows = Vec::new();
    for (reg_num, outcome) in results {
        let Outcome::Success(payload) = outcome else {
            continue;
        };
        for record in &payload.pending {
            rows.push(flatten_record(reg_num, "Pending", record));
        }
        for record in &payload.disposed {
            rows.push(flatten_record(reg_num, "Disposed", record));
        }
    }
    rows
}

/// One spreadsheet row per citation: keyed columns first, then every field of
/// the opaque record passed through, with the offence list collapsed into two
/// joined columns.
fn flatten_record(reg_num: &str, status: &str, record: &Value) -> Value {
    let mut row = Map::new();
    row.insert("registration_number".to_string(), json!(reg_num));
    row.insert("status".to_string(), json!(status));

    if let Some(fields) = record.as_object() {
        for (key, value) in fields {
            if key == "offence_details" {
                continue;
            }
            row.insert(key.clone(), value.clone());
        }
    }

    let (acts, names) = offence_columns(record.get("offence_details"));
    row.insert("offense_acts".to_string(), json!(acts));
    row.insert("offense_names".to_string(), json!(names));
    Value::Object(row)
}

fn offence_columns(details: Option<&Value>) -> (String, String) {
    let Some(list) = details.and_then(Value::as_array) else {
        return ("N/A".to_string(), "N/A".to_string());
    };
    let join = |field: &str| {
        let joined = list
            .iter()
            .filter_map(|offence| offence.get(field).and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(", ");
        if joined.is_empty() {
            "N/A".to_string()
        } else {
            joined
        }
    };
    (join("act"), join("name"))
}
