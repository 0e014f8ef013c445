//! Typed identifiers and column values

use rusqlite::types::{FromSql, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Row identifier, bound verbatim to the `id = ?` parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Integer(i64),
    Text(String),
    Blob(Vec<u8>),
}

impl RowId {
    /// Parse a command-line argument
    ///
    /// Only canonical integers (those that print back as the same text)
    /// become [`RowId::Integer`]; `007` or `+1` stay text.
    pub fn parse(s: &str) -> RowId {
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => RowId::Integer(n),
            _ => RowId::Text(s.to_string()),
        }
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        RowId::Integer(value)
    }
}

impl From<i32> for RowId {
    fn from(value: i32) -> Self {
        RowId::Integer(value.into())
    }
}

impl From<u32> for RowId {
    fn from(value: u32) -> Self {
        RowId::Integer(value.into())
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId::Text(value.to_string())
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        RowId::Text(value)
    }
}

impl From<Vec<u8>> for RowId {
    fn from(value: Vec<u8>) -> Self {
        RowId::Blob(value)
    }
}

impl From<&[u8]> for RowId {
    fn from(value: &[u8]) -> Self {
        RowId::Blob(value.to_vec())
    }
}

impl ToSql for RowId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            RowId::Integer(n) => ToSqlOutput::Borrowed(ValueRef::Integer(*n)),
            RowId::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            RowId::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowId::Integer(n) => write!(f, "{}", n),
            RowId::Text(s) => write!(f, "'{}'", s),
            RowId::Blob(b) => {
                write!(f, "x'")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, "'")
            }
        }
    }
}

mod private {
    pub trait Sealed {}
}

/// Types a single column value can be read into
///
/// Implemented for `String`, `i64`, `i32`, `u32`, `f64`, `bool`, `Vec<u8>`
/// and `Option<T>` of those (`None` for SQL NULL). [`ColumnData`] accepts any
/// stored value. JSON-decodable structures are read with
/// [`RowAccessor::read_struct_as_json`](super::RowAccessor::read_struct_as_json).
pub trait ColumnValue: FromSql + private::Sealed {}

macro_rules! column_value {
    ($($t:ty),*) => {
        $(
            impl private::Sealed for $t {}
            impl ColumnValue for $t {}
        )*
    };
}

column_value!(String, i64, i32, u32, f64, bool, Vec<u8>, ColumnData);

impl<T: ColumnValue> private::Sealed for Option<T> {}
impl<T: ColumnValue> ColumnValue for Option<T> {}

/// A column value in its SQLite storage class
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnData {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl ColumnData {
    /// SQLite storage class name
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Null => "null",
            ColumnData::Integer(_) => "integer",
            ColumnData::Real(_) => "real",
            ColumnData::Text(_) => "text",
            ColumnData::Blob(_) => "blob",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnData::Null)
    }
}

impl From<ValueRef<'_>> for ColumnData {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => ColumnData::Null,
            ValueRef::Integer(n) => ColumnData::Integer(n),
            ValueRef::Real(r) => ColumnData::Real(r),
            // TEXT that is not valid UTF-8 is returned byte for byte
            ValueRef::Text(t) => match std::str::from_utf8(t) {
                Ok(text) => ColumnData::Text(text.to_string()),
                Err(_) => ColumnData::Blob(t.to_vec()),
            },
            ValueRef::Blob(b) => ColumnData::Blob(b.to_vec()),
        }
    }
}

impl FromSql for ColumnData {
    fn column_result(value: ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        Ok(ColumnData::from(value))
    }
}

impl ToSql for ColumnData {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            ColumnData::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            ColumnData::Integer(n) => ToSqlOutput::Borrowed(ValueRef::Integer(*n)),
            ColumnData::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            ColumnData::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            ColumnData::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl std::fmt::Display for ColumnData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnData::Null => write!(f, "NULL"),
            ColumnData::Integer(n) => write!(f, "{}", n),
            ColumnData::Real(r) => write!(f, "{}", r),
            ColumnData::Text(s) => write!(f, "{}", s),
            ColumnData::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}
