#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! sqlmanager - single-table row access over SQLite
//!
//! sqlmanager opens a SQLite connection, checks whether a row exists by its
//! `id`, and reads or updates single columns of that row, including fields
//! inside JSON columns. It can be used as both a command-line application and
//! a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | `cli` (default) | The `sqlmanager` binary | `clap`, `tracing-subscriber` |
//!
//! ```toml
//! # Library only
//! sqlmanager = { version = "0.1", default-features = false }
//! ```
//!
//! # Architecture
//!
//! - **[`database`]**: connection management and the [`RowAccessor`]
//! - **[`config`]**: configuration file and connection options
//! - **[`error`]**: the [`AccessorError`] returned by every operation
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use serde::Deserialize;
//! use sqlmanager::{ConnectionOptions, RowAccessor, RowId};
//!
//! #[derive(Deserialize)]
//! struct Profile {
//!     age: u32,
//! }
//!
//! let accessor = RowAccessor::open("crm", "clients", &ConnectionOptions::file("crm.sqlite3"))?;
//! let id = RowId::from(1);
//!
//! let name: String = accessor.read_column("name", &id)?;
//! let profile: Profile = accessor.read_struct_as_json("profile", &id)?;
//! accessor.update_json_field(&id, "age", "profile", &(profile.age + 1))?;
//! ```
//!
//! Table and column names are inserted into SQL text unescaped; only pass
//! names from trusted configuration. See [`database::accessor::statements`].

pub mod config;
pub mod database;
pub mod error;

pub use config::{ConnectionOptions, SqlManagerConfig};
pub use database::{ColumnData, ColumnValue, DatabaseConn, RowAccessor, RowId};
pub use error::AccessorError;
