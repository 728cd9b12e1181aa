//! Record framing and inbound classification.
//!
//! Every record on the wire is terminated by [`RECORD_DELIMITER`]; one
//! WebSocket text frame may carry several records.
//!
//! # Inbound Classification
//!
//! | `type` | `item.result.value` | Kind |
//! |--------|---------------------|------|
//! | `2` | `"Success"` | [`RecordKind::Completed`] |
//! | `2` | anything else | [`RecordKind::Failed`] |
//! | other | - | [`RecordKind::Payload`] |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Record separator (ASCII 0x1E) shared by both directions.
pub const RECORD_DELIMITER: char = '\u{1e}';

/// Protocol negotiation record sent first on a new connection.
pub const HANDSHAKE_RECORD: &str = r#"{"protocol":"json","version":1}"#;

/// Keep-alive record.
pub const KEEP_ALIVE_RECORD: &str = r#"{"type":6}"#;

/// Record type marking the end of a turn.
pub const COMPLETION_TYPE: i64 = 2;

/// Result value of a successfully completed turn.
pub const SUCCESS_VALUE: &str = "Success";

// ============================================================================
// Framing
// ============================================================================

/// Appends the delimiter to an outbound record.
#[inline]
#[must_use]
pub fn frame_record(record: &str) -> String {
    let mut framed = String::with_capacity(record.len() + RECORD_DELIMITER.len_utf8());
    framed.push_str(record);
    framed.push(RECORD_DELIMITER);
    framed
}

/// Splits an inbound text payload into records.
///
/// Empty pieces are kept; the dispatcher skips them.
#[must_use]
pub fn split_records(payload: &str) -> Vec<String> {
    payload.split(RECORD_DELIMITER).map(str::to_owned).collect()
}

// ============================================================================
// RecordKind
// ============================================================================

/// Classification of one inbound record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// Intermediate record, forwarded to the consumer.
    Payload,
    /// Terminal record with a success result, forwarded then ends the turn.
    Completed,
    /// Terminal record carrying a backend error; never forwarded.
    Failed {
        /// Value of `item.result.value`.
        value: String,
        /// Value of `item.result.message`.
        message: String,
    },
}

impl RecordKind {
    /// Returns `true` if the record ends the turn.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Payload)
    }

    /// Converts a failure classification into the matching [`Error`].
    #[must_use]
    pub fn into_error(self) -> Option<Error> {
        match self {
            Self::Failed { value, message } => Some(Error::backend(value, message)),
            _ => None,
        }
    }
}

/// Classifies a single non-empty record.
///
/// # Errors
///
/// Returns [`Error::MalformedRecord`] if the record is not valid JSON.
pub fn classify(record: &str) -> Result<RecordKind> {
    let value: Value =
        serde_json::from_str(record).map_err(|e| Error::malformed_record(e.to_string()))?;

    if record_type(&value) != Some(COMPLETION_TYPE) {
        return Ok(RecordKind::Payload);
    }

    let result_value = lookup_string(&value, "/item/result/value");
    if result_value == SUCCESS_VALUE {
        return Ok(RecordKind::Completed);
    }

    Ok(RecordKind::Failed {
        value: result_value,
        message: lookup_string(&value, "/item/result/message"),
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Reads the `type` field as an integer.
///
/// Floats truncate and numeric strings are parsed, so `2.0` and `"2"` both
/// read as `2`.
fn record_type(value: &Value) -> Option<i64> {
    match value.get("type")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

/// Reads a field as text; missing fields read as empty.
fn lookup_string(value: &Value, pointer: &str) -> String {
    match value.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
