//! Row accessor for a single table
//!
//! [`RowAccessor`] owns one SQLite connection and targets one table. Rows are
//! addressed by their `id` column. Every operation is a single blocking round
//! trip whose SQL comes from [`statements`].
//!
//! # Thread safety
//!
//! The accessor owns a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! An accessor can be moved to another thread but not shared between threads;
//! no locking is added on top of the connection.

pub mod statements;
mod value;

pub use value::{ColumnData, ColumnValue, RowId};

use crate::config::{ConnectionOptions, SqlManagerConfig};
use crate::database::core::DatabaseConn;
use crate::error::AccessorError;
use rusqlite::types::{FromSql, ToSql, ValueRef};
use rusqlite::{params, Connection, Params};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Reads and updates single rows of one table
pub struct RowAccessor {
    database_name: String,
    table_name: String,
    db: Option<DatabaseConn>,
}

impl RowAccessor {
    /// Open a connection and bind it to `table_name`
    pub fn open(
        database_name: &str,
        table_name: &str,
        options: &ConnectionOptions,
    ) -> Result<Self, AccessorError> {
        let db = DatabaseConn::open(options)?;
        info!(
            "Opened database '{}' at {} (table '{}')",
            database_name,
            options.location(),
            table_name
        );
        Ok(Self::with_connection(database_name, table_name, db))
    }

    /// Open the database and table named by a loaded configuration
    pub fn from_config(config: &SqlManagerConfig) -> Result<Self, AccessorError> {
        Self::open(
            &config.database_name,
            &config.table_name,
            &config.connection_options(),
        )
    }

    /// Wrap an already open connection
    pub fn with_connection(database_name: &str, table_name: &str, db: DatabaseConn) -> Self {
        Self {
            database_name: database_name.to_string(),
            table_name: table_name.to_string(),
            db: Some(db),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn is_closed(&self) -> bool {
        self.db.is_none()
    }

    /// The underlying connection, for statements this type does not cover
    pub fn connection(&self) -> Result<&Connection, AccessorError> {
        self.db().map(|db| &db.conn)
    }

    fn db(&self) -> Result<&DatabaseConn, AccessorError> {
        self.db.as_ref().ok_or_else(AccessorError::closed)
    }

    /// Point all later operations at another table
    ///
    /// The name is not validated.
    pub fn change_table(&mut self, table_name: impl Into<String>) {
        self.table_name = table_name.into();
        debug!("Switched to table '{}'", self.table_name);
    }

    /// Check whether a row with `id` exists
    pub fn exists(&self, id: &RowId) -> Result<bool, AccessorError> {
        let sql = statements::exists(&self.table_name);
        debug!("{} [id = {}]", sql, id);
        self.connection()?
            .query_row(&sql, [id], |row| row.get(0))
            .map_err(|e| {
                AccessorError::Query(format!(
                    "Failed to check id {} in '{}': {}",
                    id, self.table_name, e
                ))
            })
    }

    fn ensure_exists(&self, id: &RowId) -> Result<(), AccessorError> {
        if self.exists(id)? {
            return Ok(());
        }
        debug!("No row with id {} in '{}'", id, self.table_name);
        Err(AccessorError::NotFound {
            table: self.table_name.clone(),
            id: id.clone(),
        })
    }

    fn query_single<T: FromSql, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<T, AccessorError> {
        self.connection()?
            .query_row(sql, params, |row| row.get(0))
            .map_err(AccessorError::from_row_error)
    }

    /// Read one column of the row with `id`
    ///
    /// Fails with [`AccessorError::NotFound`] before querying the column when
    /// the row does not exist, and with [`AccessorError::Scan`] when the
    /// stored value does not fit `T`.
    pub fn read_column<T: ColumnValue>(
        &self,
        column: &str,
        id: &RowId,
    ) -> Result<T, AccessorError> {
        self.ensure_exists(id)?;
        let sql = statements::select_column(&self.table_name, column);
        debug!("{} [id = {}]", sql, id);
        self.query_single(&sql, [id])
    }

    /// Read one column as whatever type SQLite stored it in
    pub fn read_value(&self, column: &str, id: &RowId) -> Result<ColumnData, AccessorError> {
        self.read_column(column, id)
    }

    /// Extract one field out of a JSON column
    ///
    /// `field_path` is either a dotted field name (`address.city`) or a full
    /// JSON path (`$.tags[0]`). A missing field reads as NULL.
    pub fn read_json_field<T: ColumnValue>(
        &self,
        column: &str,
        field_path: &str,
        id: &RowId,
    ) -> Result<T, AccessorError> {
        self.ensure_exists(id)?;
        let sql = statements::select_json_field(&self.table_name, column);
        let path = statements::json_path(field_path);
        debug!("{} [path = {}, id = {}]", sql, path, id);
        self.query_single(&sql, params![path, id])
    }

    /// Read a whole column and decode it as JSON
    ///
    /// TEXT and BLOB values are decoded as-is; NULL decodes as JSON `null`.
    pub fn read_struct_as_json<T: DeserializeOwned>(
        &self,
        column: &str,
        id: &RowId,
    ) -> Result<T, AccessorError> {
        self.ensure_exists(id)?;
        let sql = statements::select_column(&self.table_name, column);
        debug!("{} [id = {}]", sql, id);

        let bytes: Option<Vec<u8>> = self
            .connection()?
            .query_row(&sql, [id], |row| match row.get_ref(0)? {
                ValueRef::Text(b) | ValueRef::Blob(b) => Ok(Some(b.to_vec())),
                ValueRef::Null => Ok(None),
                other => Err(rusqlite::Error::InvalidColumnType(
                    0,
                    column.to_string(),
                    other.data_type(),
                )),
            })
            .map_err(AccessorError::from_row_error)?;

        let bytes = bytes.unwrap_or_else(|| b"null".to_vec());
        serde_json::from_slice(&bytes).map_err(|e| {
            AccessorError::Deserialization(format!(
                "Failed to decode column '{}' of id {}: {}",
                column, id, e
            ))
        })
    }

    /// Replace one column of the row with `id`
    ///
    /// Returns the number of rows changed. A missing id is not an error: the
    /// update simply changes zero rows.
    pub fn update_column<V: ToSql>(
        &self,
        id: &RowId,
        column: &str,
        value: V,
    ) -> Result<usize, AccessorError> {
        let sql = statements::update_column(&self.table_name, column);
        debug!("{} [id = {}]", sql, id);
        self.write(&sql, params![value, id], id)
    }

    /// Set one field inside a JSON column, leaving the rest of the document alone
    ///
    /// `value` is serialized to JSON, so strings stay strings and structs
    /// become objects. A NULL column stays NULL. Like
    /// [`update_column`](Self::update_column), a missing id changes zero rows.
    pub fn update_json_field<V: Serialize + ?Sized>(
        &self,
        id: &RowId,
        field_path: &str,
        column: &str,
        value: &V,
    ) -> Result<usize, AccessorError> {
        let json = to_json(value)?;
        let sql = statements::update_json_field(&self.table_name, column);
        let path = statements::json_path(field_path);
        debug!("{} [path = {}, value = {}, id = {}]", sql, path, json, id);
        self.write(&sql, params![path, json, id], id)
    }

    /// Replace a whole column with the JSON encoding of `value`
    pub fn write_json<V: Serialize + ?Sized>(
        &self,
        id: &RowId,
        column: &str,
        value: &V,
    ) -> Result<usize, AccessorError> {
        let json = to_json(value)?;
        self.update_column(id, column, json)
    }

    fn write<P: Params>(&self, sql: &str, params: P, id: &RowId) -> Result<usize, AccessorError> {
        let changed = self.db()?.execute(sql, params)?;
        if changed == 0 {
            warn!("No row with id {} in '{}', nothing updated", id, self.table_name);
        }
        Ok(changed)
    }

    /// Prepare and execute an arbitrary statement
    ///
    /// Returns the number of rows changed.
    pub fn execute<P: Params>(&self, query: &str, params: P) -> Result<usize, AccessorError> {
        debug!("{}", query);
        self.db()?.execute(query, params)
    }

    /// Run a query returning a single boolean, e.g. a custom `EXISTS` check
    pub fn validate<P: Params>(&self, query: &str, params: P) -> Result<bool, AccessorError> {
        debug!("{}", query);
        self.query_single(query, params)
    }

    /// Close the connection
    ///
    /// Every later call, including a second `close`, fails with
    /// [`AccessorError::Connection`]. If SQLite refuses to close, the
    /// connection is kept open and the error is returned.
    pub fn close(&mut self) -> Result<(), AccessorError> {
        let db = self.db.take().ok_or_else(AccessorError::closed)?;
        match db.close() {
            Ok(()) => {
                info!("Closed database '{}'", self.database_name);
                Ok(())
            }
            Err((db, e)) => {
                self.db = Some(db);
                Err(e)
            }
        }
    }
}

fn to_json<V: Serialize + ?Sized>(value: &V) -> Result<String, AccessorError> {
    serde_json::to_string(value).map_err(|e| AccessorError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Address {
        city: String,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        age: u32,
        address: Address,
    }

    fn setup_accessor() -> RowAccessor {
        let accessor =
            RowAccessor::open("test", "clients", &ConnectionOptions::in_memory()).unwrap();
        accessor
            .execute(
                "CREATE TABLE clients (
                    id INTEGER PRIMARY KEY,
                    name TEXT,
                    balance REAL,
                    avatar BLOB,
                    profile TEXT
                )",
                [],
            )
            .unwrap();
        accessor
            .execute(
                "INSERT INTO clients (id, name, balance, avatar, profile)
                 VALUES (1, 'alice', 12.5, x'0102', '{\"age\": 30, \"address\": {\"city\": \"Oslo\"}}')",
                [],
            )
            .unwrap();
        accessor
    }

    #[test]
    fn test_accessor_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RowAccessor>();
    }

    #[test]
    fn test_exists() {
        let accessor = setup_accessor();
        assert!(accessor.exists(&RowId::from(1)).unwrap());
        assert!(!accessor.exists(&RowId::from(2)).unwrap());
    }

    #[test]
    fn test_exists_empty_table() {
        let accessor = setup_accessor();
        accessor.execute("DELETE FROM clients", []).unwrap();
        assert!(!accessor.exists(&RowId::from(999)).unwrap());
    }

    #[test]
    fn test_exists_missing_table() {
        let mut accessor = setup_accessor();
        accessor.change_table("no_such_table");
        let err = accessor.exists(&RowId::from(1)).unwrap_err();
        assert!(matches!(err, AccessorError::Query(_)));
    }

    #[test]
    fn test_read_column() {
        let accessor = setup_accessor();
        let id = RowId::from(1);

        let name: String = accessor.read_column("name", &id).unwrap();
        assert_eq!(name, "alice");

        let balance: f64 = accessor.read_column("balance", &id).unwrap();
        assert_eq!(balance, 12.5);

        let avatar: Vec<u8> = accessor.read_column("avatar", &id).unwrap();
        assert_eq!(avatar, vec![1, 2]);

        let id_again: i64 = accessor.read_column("id", &id).unwrap();
        assert_eq!(id_again, 1);
    }

    #[test]
    fn test_read_column_null() {
        let accessor = setup_accessor();
        accessor
            .execute("INSERT INTO clients (id) VALUES (2)", [])
            .unwrap();
        let id = RowId::from(2);

        let name: Option<String> = accessor.read_column("name", &id).unwrap();
        assert_eq!(name, None);

        let err = accessor.read_column::<String>("name", &id).unwrap_err();
        assert!(matches!(err, AccessorError::Scan(_)));
    }

    #[test]
    fn test_read_column_type_mismatch() {
        let accessor = setup_accessor();
        let err = accessor
            .read_column::<i64>("name", &RowId::from(1))
            .unwrap_err();
        assert!(matches!(err, AccessorError::Scan(_)));
    }

    #[test]
    fn test_read_column_unknown_column() {
        let accessor = setup_accessor();
        let err = accessor
            .read_column::<String>("nickname", &RowId::from(1))
            .unwrap_err();
        assert!(matches!(err, AccessorError::Query(_)));
    }

    #[test]
    fn test_reads_of_missing_id_stop_at_existence_check() {
        let accessor = setup_accessor();
        let id = RowId::from(999);

        // the column does not exist, so reaching the read query would be a Query error
        let err = accessor.read_column::<String>("nickname", &id).unwrap_err();
        assert_eq!(
            err,
            AccessorError::NotFound {
                table: "clients".to_string(),
                id: id.clone(),
            }
        );

        let err = accessor
            .read_json_field::<i64>("nickname", "age", &id)
            .unwrap_err();
        assert!(err.is_not_found());

        let err = accessor
            .read_struct_as_json::<Profile>("nickname", &id)
            .unwrap_err();
        assert!(err.is_not_found());

        assert!(accessor.read_value("nickname", &id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_value() {
        let accessor = setup_accessor();
        let id = RowId::from(1);

        assert_eq!(
            accessor.read_value("name", &id).unwrap(),
            ColumnData::Text("alice".to_string())
        );
        assert_eq!(
            accessor.read_value("balance", &id).unwrap(),
            ColumnData::Real(12.5)
        );
        assert_eq!(
            accessor.read_value("avatar", &id).unwrap(),
            ColumnData::Blob(vec![1, 2])
        );
    }

    #[test]
    fn test_read_json_field() {
        let accessor = setup_accessor();
        let id = RowId::from(1);

        let age: i64 = accessor.read_json_field("profile", "age", &id).unwrap();
        assert_eq!(age, 30);

        let city: String = accessor
            .read_json_field("profile", "address.city", &id)
            .unwrap();
        assert_eq!(city, "Oslo");

        let city: String = accessor
            .read_json_field("profile", "$.address.city", &id)
            .unwrap();
        assert_eq!(city, "Oslo");

        let missing: Option<i64> = accessor.read_json_field("profile", "height", &id).unwrap();
        assert_eq!(missing, None);

        let err = accessor
            .read_json_field::<i64>("profile", "address.city", &id)
            .unwrap_err();
        assert!(matches!(err, AccessorError::Scan(_)));
    }

    #[test]
    fn test_read_struct_as_json() {
        let accessor = setup_accessor();
        let id = RowId::from(1);

        let profile: Profile = accessor.read_struct_as_json("profile", &id).unwrap();
        assert_eq!(
            profile,
            Profile {
                age: 30,
                address: Address {
                    city: "Oslo".to_string()
                },
            }
        );

        let raw: BTreeMap<String, serde_json::Value> =
            accessor.read_struct_as_json("profile", &id).unwrap();
        assert_eq!(raw["age"], serde_json::json!(30));
    }

    #[test]
    fn test_read_struct_as_json_errors() {
        let accessor = setup_accessor();
        let id = RowId::from(1);

        // not JSON at all
        let err = accessor
            .read_struct_as_json::<Profile>("name", &id)
            .unwrap_err();
        assert!(matches!(err, AccessorError::Deserialization(_)));

        // valid JSON, wrong shape
        accessor
            .update_column(&id, "profile", "{\"age\": \"old\"}")
            .unwrap();
        let err = accessor
            .read_struct_as_json::<Profile>("profile", &id)
            .unwrap_err();
        assert!(matches!(err, AccessorError::Deserialization(_)));

        // numbers are not byte sequences
        let err = accessor
            .read_struct_as_json::<Profile>("balance", &id)
            .unwrap_err();
        assert!(matches!(err, AccessorError::Scan(_)));
    }

    #[test]
    fn test_read_struct_as_json_null() {
        let accessor = setup_accessor();
        accessor
            .execute("INSERT INTO clients (id) VALUES (2)", [])
            .unwrap();
        let id = RowId::from(2);

        let profile: Option<Profile> = accessor.read_struct_as_json("profile", &id).unwrap();
        assert_eq!(profile, None);

        let err = accessor
            .read_struct_as_json::<Profile>("profile", &id)
            .unwrap_err();
        assert!(matches!(err, AccessorError::Deserialization(_)));
    }

    #[test]
    fn test_write_json_round_trip() {
        let accessor = setup_accessor();
        let id = RowId::from(1);
        let profile = Profile {
            age: 41,
            address: Address {
                city: "Bergen".to_string(),
            },
        };

        assert_eq!(accessor.write_json(&id, "profile", &profile).unwrap(), 1);
        let read: Profile = accessor.read_struct_as_json("profile", &id).unwrap();
        assert_eq!(read, profile);

        // blobs decode the same way
        accessor
            .update_column(&id, "avatar", serde_json::to_vec(&profile).unwrap())
            .unwrap();
        let read: Profile = accessor.read_struct_as_json("avatar", &id).unwrap();
        assert_eq!(read, profile);
    }

    #[test]
    fn test_update_json_field() {
        let accessor = setup_accessor();
        let id = RowId::from(1);

        assert_eq!(accessor.update_json_field(&id, "age", "profile", &31).unwrap(), 1);
        let age: i64 = accessor.read_json_field("profile", "age", &id).unwrap();
        assert_eq!(age, 31);

        accessor
            .update_json_field(&id, "address.city", "profile", "Trondheim")
            .unwrap();
        let profile: Profile = accessor.read_struct_as_json("profile", &id).unwrap();
        assert_eq!(profile.age, 31);
        assert_eq!(profile.address.city, "Trondheim");

        accessor
            .update_json_field(&id, "tags", "profile", &vec!["vip", "beta"])
            .unwrap();
        let tag: String = accessor.read_json_field("profile", "$.tags[1]", &id).unwrap();
        assert_eq!(tag, "beta");
    }

    #[test]
    fn test_update_column() {
        let accessor = setup_accessor();
        let id = RowId::from(1);

        assert_eq!(accessor.update_column(&id, "name", "bob").unwrap(), 1);
        let name: String = accessor.read_column("name", &id).unwrap();
        assert_eq!(name, "bob");

        assert_eq!(
            accessor
                .update_column(&id, "name", ColumnData::Null)
                .unwrap(),
            1
        );
        let name: Option<String> = accessor.read_column("name", &id).unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn test_writes_to_missing_id_change_nothing() {
        let accessor = setup_accessor();
        let id = RowId::from(404);

        assert_eq!(accessor.update_column(&id, "name", "ghost").unwrap(), 0);
        assert_eq!(accessor.update_json_field(&id, "age", "profile", &1).unwrap(), 0);
        assert_eq!(accessor.write_json(&id, "profile", &"{}").unwrap(), 0);
        assert!(!accessor.exists(&id).unwrap());
    }

    #[test]
    fn test_update_unknown_column() {
        let accessor = setup_accessor();
        let err = accessor
            .update_column(&RowId::from(1), "nickname", "al")
            .unwrap_err();
        assert!(matches!(err, AccessorError::Query(_)));
    }

    #[test]
    fn test_change_table() {
        let mut accessor = setup_accessor();
        accessor
            .execute("CREATE TABLE archive (id TEXT PRIMARY KEY, name TEXT)", [])
            .unwrap();
        accessor
            .execute("INSERT INTO archive (id, name) VALUES ('a1', 'carol')", [])
            .unwrap();

        let before = accessor.exists(&RowId::from(1)).unwrap();
        accessor.change_table("archive");
        assert_eq!(accessor.table_name(), "archive");

        assert!(before);
        assert!(!accessor.exists(&RowId::from(1)).unwrap());
        assert!(accessor.exists(&RowId::from("a1")).unwrap());

        // ids are matched verbatim
        assert!(!accessor.exists(&RowId::from("A1")).unwrap());

        let name: String = accessor.read_column("name", &RowId::from("a1")).unwrap();
        assert_eq!(name, "carol");
    }

    #[test]
    fn test_execute_and_validate() {
        let accessor = setup_accessor();

        let changed = accessor
            .execute(
                "INSERT INTO clients (id, name) VALUES (?1, ?2), (?3, ?4)",
                params![2, "dave", 3, "erin"],
            )
            .unwrap();
        assert_eq!(changed, 2);

        let found = accessor
            .validate("SELECT EXISTS(SELECT 1 FROM clients WHERE name = ?1)", ["erin"])
            .unwrap();
        assert!(found);

        let found = accessor
            .validate("SELECT EXISTS(SELECT 1 FROM clients WHERE name = ?1)", ["zoe"])
            .unwrap();
        assert!(!found);

        match accessor.execute("INSERT INTO nowhere VALUES (1)", []) {
            Err(AccessorError::Query(msg)) => assert!(msg.starts_with("Failed to prepare")),
            other => panic!("unexpected result: {:?}", other),
        }

        // updates share the same execution path and its cached statements
        let id = RowId::from(2);
        assert_eq!(accessor.update_column(&id, "name", "dan").unwrap(), 1);
        assert_eq!(accessor.update_column(&id, "name", "dave").unwrap(), 1);
        match accessor.execute("INSERT INTO clients (id) VALUES (2)", []) {
            Err(AccessorError::Query(msg)) => assert!(msg.starts_with("Failed to execute")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_close() {
        let mut accessor = setup_accessor();
        assert!(!accessor.is_closed());

        accessor.close().unwrap();
        assert!(accessor.is_closed());

        let id = RowId::from(1);
        assert!(matches!(
            accessor.exists(&id).unwrap_err(),
            AccessorError::Connection(_)
        ));
        assert!(matches!(
            accessor.read_column::<String>("name", &id).unwrap_err(),
            AccessorError::Connection(_)
        ));
        assert!(matches!(
            accessor.update_column(&id, "name", "x").unwrap_err(),
            AccessorError::Connection(_)
        ));
        assert!(matches!(
            accessor.execute("SELECT 1", []).unwrap_err(),
            AccessorError::Connection(_)
        ));
        assert!(accessor.connection().is_err());

        // closing twice is reported, not a crash
        assert_eq!(accessor.close().unwrap_err(), AccessorError::closed());
    }

    #[test]
    fn test_from_config_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = SqlManagerConfig {
            database_path: dir.path().join("crm.sqlite3").to_string_lossy().to_string(),
            database_name: "crm".to_string(),
            table_name: "clients".to_string(),
            busy_timeout_secs: 1,
            read_only: false,
        };

        let mut accessor = RowAccessor::from_config(&config).unwrap();
        assert_eq!(accessor.database_name(), "crm");
        accessor
            .execute("CREATE TABLE clients (id INTEGER PRIMARY KEY, profile TEXT)", [])
            .unwrap();
        accessor
            .execute(
                "INSERT INTO clients (id, profile) VALUES (1, '{\"age\": 30}')",
                [],
            )
            .unwrap();
        accessor.close().unwrap();

        let accessor = RowAccessor::from_config(&config).unwrap();
        let age: i64 = accessor
            .read_json_field("profile", "age", &RowId::from(1))
            .unwrap();
        assert_eq!(age, 30);
    }
}
