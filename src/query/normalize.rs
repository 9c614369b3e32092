//! Row normalization: value truncation and temporal coercion.

use crate::db::{Row, Value};
use chrono::{DateTime, Utc};

/// Longest text or byte value kept intact, in characters (bytes for binary
/// data). Byte values that hold UTF-8 text are never cut inside a character.
pub const MAX_VALUE_LENGTH: usize = 300;

/// Marker appended to truncated values.
pub const TRUNCATION_SUFFIX: &str = "...";

/// Normalizes every row.
pub fn normalize_rows(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter().map(normalize_row).collect()
}

/// Normalizes one row, value by value.
pub fn normalize_row(row: Row) -> Row {
    row.map_values(normalize_value)
}

/// Truncates oversized text/bytes, then turns timestamps into epoch seconds.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(truncate_text(s, MAX_VALUE_LENGTH)),
        Value::Bytes(b) => Value::Bytes(truncate_bytes(b, MAX_VALUE_LENGTH)),
        Value::Timestamp(ts) => Value::Float(epoch_seconds(&ts)),
        other => other,
    }
}

/// Shortens text longer than `length` characters.
///
/// The text is cut so that the result, suffix included, fits in `length`
/// characters, then backed up to the last space inside the cut so words are
/// not split. Without a space the hard cut is kept.
pub fn truncate_text(text: String, length: usize) -> String {
    if length == 0 || text.chars().count() <= length {
        return text;
    }

    let keep = length.saturating_sub(TRUNCATION_SUFFIX.chars().count());
    let cut = text
        .char_indices()
        .nth(keep)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let head = &text[..cut];
    let head = head.rsplit_once(' ').map_or(head, |(before, _)| before);

    format!("{head}{TRUNCATION_SUFFIX}")
}

/// Shortens binary data longer than `length` bytes.
///
/// When the data is valid UTF-8 the cut backs up to a character boundary so
/// the result stays valid UTF-8.
pub fn truncate_bytes(mut bytes: Vec<u8>, length: usize) -> Vec<u8> {
    if length == 0 || bytes.len() <= length {
        return bytes;
    }

    let mut cut = length.saturating_sub(TRUNCATION_SUFFIX.len());
    if let Ok(text) = std::str::from_utf8(&bytes) {
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
    }
    bytes.truncate(cut);
    bytes.extend_from_slice(TRUNCATION_SUFFIX.as_bytes());
    bytes
}

/// Seconds since the Unix epoch, with a microsecond fraction.
pub fn epoch_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_micros()) / 1_000_000.0
}
