//! Error types returned by the row accessor

use crate::database::RowId;

/// Errors that can occur while accessing rows
///
/// Every variant carries the message reported by the underlying driver (or
/// by `serde_json` for the JSON variants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorError {
    /// Failed to open, configure or close the connection, or the connection is closed
    Connection(String),
    /// Failed to prepare or execute a statement
    Query(String),
    /// The returned value does not match the requested type
    Scan(String),
    /// No row with the given id exists in the table
    NotFound { table: String, id: RowId },
    /// The stored bytes are not valid JSON for the requested type
    Deserialization(String),
    /// The value to be written could not be encoded as JSON
    Serialization(String),
}

impl AccessorError {
    pub(crate) fn closed() -> Self {
        AccessorError::Connection("connection is closed".to_string())
    }

    /// Classify an error raised while reading a single value out of a row.
    pub(crate) fn from_row_error(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => AccessorError::Scan(e.to_string()),
            _ => AccessorError::Query(e.to_string()),
        }
    }

    /// Returns true if this is a [`AccessorError::NotFound`] error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessorError::NotFound { .. })
    }
}

impl std::fmt::Display for AccessorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessorError::Connection(e) => write!(f, "Connection error: {}", e),
            AccessorError::Query(e) => write!(f, "Query error: {}", e),
            AccessorError::Scan(e) => write!(f, "Scan error: {}", e),
            AccessorError::NotFound { table, id } => {
                write!(f, "No row with id {} found in table '{}'", id, table)
            }
            AccessorError::Deserialization(e) => write!(f, "Deserialization error: {}", e),
            AccessorError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for AccessorError {}
