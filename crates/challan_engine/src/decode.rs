use challan_core::ChallanPayload;
use serde_json::Value;

/// Application-level "no records" markers. The service reports an empty
/// history this way rather than with an empty data object.
const NO_RECORDS_CODE: &str = "305";
const NO_RECORDS_MESSAGE: &str = "No Records Found!";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("remote reported an error envelope")]
    ErrorEnvelope,
    #[error("response array missing or empty")]
    MissingResponse,
    #[error("lookup status was {0:?}, not SUCCESS")]
    NotSuccess(String),
}

/// Decode the remote JSON envelope into a payload.
///
/// Shape, per the upstream service:
/// `{ "error": "false", "response": [ { "responseStatus": "SUCCESS",
/// "response": { "code"/"message" | "data": { "Pending_data": [...],
/// "Disposed_data": [...] } } } ] }`.
///
/// The explicit no-records answer decodes to an empty payload, NOT an error.
/// Missing record buckets default to empty. Anything without a SUCCESS
/// envelope is a decode failure, which the caller surfaces as a recorded
/// lookup failure.
pub fn decode_envelope(body: &Value) -> Result<ChallanPayload, DecodeError> {
    if body.get("error").and_then(Value::as_str) == Some("true") {
        return Err(DecodeError::ErrorEnvelope);
    }

    let first = body
        .get("response")
        .and_then(|r| r.get(0))
        .ok_or(DecodeError::MissingResponse)?;

    let status = first
        .get("responseStatus")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if status != "SUCCESS" {
        return Err(DecodeError::NotSuccess(status.to_string()));
    }

    let inner = first.get("response").ok_or(DecodeError::MissingResponse)?;

    if inner.get("code").and_then(Value::as_str) == Some(NO_RECORDS_CODE)
        || inner.get("message").and_then(Value::as_str) == Some(NO_RECORDS_MESSAGE)
    {
        return Ok(ChallanPayload::empty());
    }

    match inner.get("data") {
        Some(data) if !data.is_null() => Ok(ChallanPayload {
            pending: array_field(data, "Pending_data"),
            disposed: array_field(data, "Disposed_data"),
        }),
        // Well-formed success without a data object: treat as empty rather
        // than guessing at an unexpected shape.
        _ => Ok(ChallanPayload::empty()),
    }
}

fn array_field(data: &Value, key: &str) -> Vec<Value> {
    data.get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
