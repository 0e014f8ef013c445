//! Database module
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   └── connection  # SQLite DatabaseConn wrapper
//! │
//! └── accessor/       # Single-table row access
//!     ├── statements  # All SQL text
//!     └── value       # RowId, ColumnValue, ColumnData
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sqlmanager::config::ConnectionOptions;
//! use sqlmanager::database::{RowAccessor, RowId};
//!
//! let options = ConnectionOptions::file("crm.sqlite3");
//! let mut clients = RowAccessor::open("crm", "clients", &options)?;
//!
//! let id = RowId::from(1);
//! if clients.exists(&id)? {
//!     let age: i64 = clients.read_json_field("profile", "age", &id)?;
//!     clients.update_json_field(&id, "age", "profile", &(age + 1))?;
//! }
//!
//! clients.close()?;
//! ```

pub mod accessor;
pub mod core;

pub use self::core::DatabaseConn;

pub use accessor::{ColumnData, ColumnValue, RowAccessor, RowId};
