//! Line item extraction from a transaction's impressions payload
//!
//! The payload is a JSON array of impression records, for example
//! `[{"LINEITEMID":"L1"},{"LINEITEMID":"L2"},{"LINEITEMID":"L1"}]`.
//! Each distinct line item counts once per transaction, in first-seen order.

use serde_json::Value;

use crate::error::PayloadError;
use crate::table::json_line_item_id;

/// Field holding the line item id inside an impression record
pub const DEFAULT_LINE_ITEM_FIELD: &str = "LINEITEMID";

/// Parse a payload into its unique line item ids.
///
/// An absent or blank payload is valid and yields no ids.
pub fn parse_impressions(payload: Option<&str>, field: &str) -> Result<Vec<String>, PayloadError> {
    let Some(payload) = payload.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(Vec::new());
    };

    let records = match serde_json::from_str::<Value>(payload)? {
        Value::Array(records) => records,
        other => {
            return Err(PayloadError::NotAnArray {
                found: json_kind(&other),
            });
        }
    };

    let mut ids: Vec<String> = Vec::new();
    for record in &records {
        let Some(value) = record.as_object().and_then(|obj| obj.get(field)) else {
            continue;
        };
        if !is_truthy(value) {
            continue;
        }
        match json_line_item_id(value) {
            Some(id) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            None => tracing::debug!(%value, "skipping non-scalar line item id"),
        }
    }

    Ok(ids)
}

/// Extract unique line item ids, degrading to an empty list on a bad payload.
///
/// A malformed payload is logged and treated as "no line items" so one bad
/// row never aborts the batch.
pub fn extract_line_item_ids(payload: Option<&str>, field: &str) -> Vec<String> {
    parse_impressions(payload, field).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "error parsing impressions");
        Vec::new()
    })
}

/// JSON truthiness: null, false, 0 and empty strings/collections are false
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
