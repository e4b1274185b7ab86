//! Conversion of decoded JSON values into bindable SQL parameters.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};
use std::fmt;

use crate::config::TIMESTAMP_TYPE_MARKER;

/// A parameter value ready to be bound into an INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    /// Epoch seconds reinterpreted for a timestamp column
    Timestamp(DateTime<Utc>),
    /// JSON text of a nested object
    Json(String),
    Array(Vec<Value>),
}

impl SqlValue {
    /// Text form of the value, as Postgres would read it from a literal
    ///
    /// `None` for SQL NULL.
    pub fn to_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(b) => Some(b.to_string()),
            SqlValue::Number(n) => Some(number_text(n)),
            SqlValue::Text(s) | SqlValue::Json(s) => Some(s.clone()),
            SqlValue::Timestamp(ts) => Some(ts.to_rfc3339()),
            SqlValue::Array(items) => Some(Value::Array(items.clone()).to_string()),
        }
    }
}

/// Plain decimal text of a number
///
/// Floats drop a zero fraction and never use exponent notation, so `1.0` and
/// `1e3` read back as `1` and `1000` for integer columns.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Text(s) => write!(f, "{:?}", s),
            other => f.write_str(&other.to_text().unwrap_or_default()),
        }
    }
}

/// Why a value could not be converted for its column
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("failed to encode json: {source}")]
    EncodeJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("{value} seconds since the Unix epoch is out of timestamp range")]
    TimestampOutOfRange { value: f64 },
}

/// Whether a declared column type holds timestamps
pub fn is_timestamp_type(declared_type: &str) -> bool {
    declared_type
        .to_ascii_lowercase()
        .contains(TIMESTAMP_TYPE_MARKER)
}

/// Convert a decoded JSON value for a column with the given declared type
///
/// Numbers bound for timestamp columns become timestamps, objects become JSON
/// text, and everything else passes through unchanged.
pub fn convert_value(value: Value, declared_type: &str) -> Result<SqlValue, ConversionError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Number(n) if is_timestamp_type(declared_type) => epoch_seconds_to_timestamp(&n),
        Value::Number(n) => Ok(SqlValue::Number(n)),
        Value::Bool(b) => Ok(SqlValue::Bool(b)),
        Value::String(s) => Ok(SqlValue::Text(s)),
        Value::Array(items) => Ok(SqlValue::Array(items)),
        Value::Object(map) => serde_json::to_string(&map)
            .map(SqlValue::Json)
            .map_err(|source| ConversionError::EncodeJson { source }),
    }
}

/// Whole seconds since the Unix epoch; any fraction is truncated toward zero
fn epoch_seconds_to_timestamp(n: &Number) -> Result<SqlValue, ConversionError> {
    let value = n.as_f64().unwrap_or(f64::NAN);
    let seconds = value.trunc();

    if !seconds.is_finite() || seconds < i64::MIN as f64 || seconds > i64::MAX as f64 {
        return Err(ConversionError::TimestampOutOfRange { value });
    }

    DateTime::from_timestamp(seconds as i64, 0)
        .map(SqlValue::Timestamp)
        .ok_or(ConversionError::TimestampOutOfRange { value })
}
