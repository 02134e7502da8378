use std::collections::HashSet;

use thiserror::Error;

/// Plausibility bounds for a collapsed registration number. Indian plates run
/// from 6 characters ("DL1CAB1" style short series) up to 12 with BH-series
/// suffixes; anything outside is treated as a malformed cell.
pub const MIN_PLAUSIBLE_LEN: usize = 6;
pub const MAX_PLAUSIBLE_LEN: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("no valid registration numbers found in file")]
    EmptyResult,
}

/// Normalize one raw cell value: strip all whitespace and upper-case.
/// Returns `None` when nothing is left.
pub fn normalize_token(raw: &str) -> Option<String> {
    let collapsed: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Normalize and deduplicate raw tokens, preserving first-appearance order.
pub fn dedupe_normalized<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for token in raw {
        if let Some(reg_num) = normalize_token(token.as_ref()) {
            if seen.insert(reg_num.clone()) {
                out.push(reg_num);
            }
        }
    }
    out
}

fn is_plausible(reg_num: &str) -> bool {
    let len = reg_num.chars().count();
    (MIN_PLAUSIBLE_LEN..=MAX_PLAUSIBLE_LEN).contains(&len)
}

/// Build the deduplicated registration set from raw extracted cell values.
///
/// Fails with [`IngestError::EmptyResult`] when no token survives
/// normalization and the plausibility filter; the caller surfaces that to the
/// user and keeps any existing run state untouched.
pub fn build_registration_set<I, S>(raw: I) -> Result<Vec<String>, IngestError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let regs: Vec<String> = dedupe_normalized(raw)
        .into_iter()
        .filter(|reg_num| is_plausible(reg_num))
        .collect();
    if regs.is_empty() {
        return Err(IngestError::EmptyResult);
    }
    Ok(regs)
}
