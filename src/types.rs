//! Common types used throughout dbhandler
//!
//! Cell values, rows and the column types accepted by `create_table`.

use crate::error::{Error, Result};
use base64::Engine as _;
use chrono::{NaiveDate, NaiveDateTime};
use duckdb::types::{ToSql, ToSqlOutput, Value as DuckValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// A single result row, one cell per column
pub type Row = Vec<Value>;

// ============================================================================
// Cell Values
// ============================================================================

/// A single cell read from or written to the database
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Check if the value is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer payload, if any
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a JSON value
    ///
    /// Blobs are base64 encoded; dates and timestamps become ISO-8601 strings.
    /// Non-finite floats have no JSON form and map to null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Integer(i) => JsonValue::Number((*i).into()),
            Value::Real(f) => {
                serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
            }
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Blob(b) => {
                JsonValue::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            Value::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            Value::Timestamp(ts) => {
                JsonValue::String(ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.6f")),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => DuckValue::Null,
            Value::Boolean(b) => DuckValue::Boolean(*b),
            Value::Integer(i) => DuckValue::BigInt(*i),
            Value::Real(f) => DuckValue::Double(*f),
            Value::Text(s) => DuckValue::Text(s.clone()),
            Value::Blob(b) => DuckValue::Blob(b.clone()),
            // DuckDB casts ISO text into DATE / TIMESTAMP columns on insert
            Value::Date(d) => DuckValue::Text(d.format("%Y-%m-%d").to_string()),
            Value::Timestamp(ts) => {
                DuckValue::Text(ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
            }
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ============================================================================
// Column Types
// ============================================================================

/// Column type for explicitly declared tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
    Blob,
}

impl ColumnType {
    /// SQL type name used in `CREATE TABLE`
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "BIGINT",
            ColumnType::Real => "DOUBLE",
            ColumnType::Text => "VARCHAR",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Blob => "BLOB",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "bigint" => Ok(ColumnType::Integer),
            "float" | "real" | "double" => Ok(ColumnType::Real),
            "str" | "text" | "varchar" | "string" => Ok(ColumnType::Text),
            "bool" | "boolean" => Ok(ColumnType::Boolean),
            "blob" | "bytes" => Ok(ColumnType::Blob),
            other => Err(Error::unsupported_type(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("int", ColumnType::Integer ; "int")]
    #[test_case("INTEGER", ColumnType::Integer ; "integer uppercase")]
    #[test_case("float", ColumnType::Real ; "float")]
    #[test_case(" str ", ColumnType::Text ; "str padded")]
    #[test_case("varchar", ColumnType::Text ; "varchar")]
    #[test_case("Bool", ColumnType::Boolean ; "bool")]
    #[test_case("bytes", ColumnType::Blob ; "bytes")]
    fn test_column_type_from_str(input: &str, expected: ColumnType) {
        assert_eq!(input.parse::<ColumnType>().unwrap(), expected);
    }

    #[test]
    fn test_column_type_unknown() {
        let err = "geometry".parse::<ColumnType>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
    }

    #[test]
    fn test_column_type_serde() {
        let parsed: ColumnType = serde_json::from_str("\"integer\"").unwrap();
        assert_eq!(parsed, ColumnType::Integer);
        assert_eq!(ColumnType::Text.to_string(), "VARCHAR");
    }

    #[test]
    fn test_value_to_json() {
        assert_eq!(Value::Null.to_json(), JsonValue::Null);
        assert_eq!(Value::Integer(42).to_json(), json!(42));
        assert_eq!(Value::Real(1.5).to_json(), json!(1.5));
        assert_eq!(Value::Real(f64::NAN).to_json(), JsonValue::Null);
        assert_eq!(Value::from("hello").to_json(), json!("hello"));
        assert_eq!(Value::Blob(b"hi".to_vec()).to_json(), json!("aGk="));

        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(Value::Date(date).to_json(), json!("2024-01-31"));
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7_i64)), Value::Integer(7));
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Text("x".into()).as_i64(), None);
    }
}
