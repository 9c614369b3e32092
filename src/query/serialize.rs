//! JSON encoding of projected rows.
//!
//! Values that JSON cannot represent (non-UTF-8 bytes, NaN, infinities)
//! fail the whole payload rather than being silently rewritten.

use crate::db::Value;
use crate::error::{ExecutorError, Result};
use crate::query::projection::ProjectedRow;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Encodes the rows as JSON text.
pub fn to_json(rows: &[ProjectedRow]) -> Result<String> {
    serde_json::to_string(rows).map_err(|e| ExecutorError::serialization(e.to_string()))
}

impl Serialize for ProjectedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ProjectedRow::Named(row) => {
                let mut map = serializer.serialize_map(Some(row.len()))?;
                for (column, value) in row.iter() {
                    map.serialize_entry(column, value)?;
                }
                map.end()
            }
            ProjectedRow::Values(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(f) => Err(S::Error::custom(format!(
                "Out of range float values are not JSON compliant: {f}"
            ))),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => serializer.serialize_str(s),
                Err(_) => Err(S::Error::custom(format!(
                    "Object of type {} is not JSON serializable",
                    self.type_name()
                ))),
            },
            // Normalization turns instants into floats; keep an ISO form for
            // callers that serialize raw rows.
            Value::Timestamp(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
