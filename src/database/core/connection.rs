//! Database connection management
//!
//! This module provides the core database connection wrapper used by the row accessor.

use crate::config::ConnectionOptions;
use crate::error::AccessorError;
use rusqlite::Connection;
use tracing::debug;

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration and error handling.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database described by `options`
    ///
    /// If `options.path` is `None`, an in-memory database is created.
    pub fn open(options: &ConnectionOptions) -> Result<Self, AccessorError> {
        let flags = options.open_flags();
        let conn = match &options.path {
            Some(p) => Connection::open_with_flags(p, flags).map_err(|e| {
                AccessorError::Connection(format!("Failed to open database at '{}': {}", p, e))
            })?,
            None => Connection::open_in_memory_with_flags(flags).map_err(|e| {
                AccessorError::Connection(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let db = DatabaseConn { conn };
        db.configure(options)?;
        Ok(db)
    }

    fn configure(&self, options: &ConnectionOptions) -> Result<(), AccessorError> {
        self.conn
            .busy_timeout(options.busy_timeout)
            .map_err(|e| AccessorError::Connection(format!("Failed to set busy timeout: {}", e)))?;

        self.conn
            .execute("PRAGMA foreign_keys=ON", [])
            .map_err(|e| {
                AccessorError::Connection(format!("Failed to enable foreign keys: {}", e))
            })?;

        // WAL needs a writable file; in-memory databases ignore it anyway
        if options.path.is_some() && !options.read_only {
            let mode: String = self
                .conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(|e| {
                    AccessorError::Connection(format!("Failed to set journal mode: {}", e))
                })?;
            debug!("journal mode set to {}", mode);
        }

        Ok(())
    }

    /// Prepare and execute one statement with bound parameters
    ///
    /// Returns the number of rows changed. Prepared statements are cached on
    /// the connection, so the fixed accessor statements are compiled once.
    pub fn execute<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<usize, AccessorError> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|e| AccessorError::Query(format!("Failed to prepare statement: {}", e)))?;
        stmt.execute(params)
            .map_err(|e| AccessorError::Query(format!("Failed to execute statement: {}", e)))
    }

    /// Close the connection
    ///
    /// On failure the connection is handed back together with the error so
    /// the caller can keep using it or retry.
    pub fn close(self) -> Result<(), (DatabaseConn, AccessorError)> {
        self.conn.close().map_err(|(conn, e)| {
            (
                DatabaseConn { conn },
                AccessorError::Connection(format!("Failed to close database: {}", e)),
            )
        })
    }
}
