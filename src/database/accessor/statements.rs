//! SQL text for the row accessor
//!
//! Every statement the accessor issues is assembled here. Table and column
//! names are written into the SQL text as-is: they are trusted configuration
//! and are neither quoted nor validated. Passing names that come from external
//! input allows SQL injection. Identifier values, JSON paths and new values
//! are always bound as parameters.
//!
//! The row key column is always named `id`.

/// `SELECT EXISTS(...)` for one id. Parameters: `?1` id.
pub fn exists(table: &str) -> String {
    format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table)
}

/// Read one column. Parameters: `?1` id.
pub fn select_column(table: &str, column: &str) -> String {
    format!("SELECT {} FROM {} WHERE id = ?1", column, table)
}

/// Extract one scalar out of a JSON column. Parameters: `?1` JSON path, `?2` id.
pub fn select_json_field(table: &str, column: &str) -> String {
    format!("SELECT {} ->> ?1 FROM {} WHERE id = ?2", column, table)
}

/// Replace a whole column. Parameters: `?1` new value, `?2` id.
pub fn update_column(table: &str, column: &str) -> String {
    format!("UPDATE {} SET {} = ?1 WHERE id = ?2", table, column)
}

/// Set one field inside a JSON column. Parameters: `?1` JSON path,
/// `?2` new value as JSON text, `?3` id.
pub fn update_json_field(table: &str, column: &str) -> String {
    format!(
        "UPDATE {table} SET {column} = json_set({column}, ?1, json(?2)) WHERE id = ?3",
        table = table,
        column = column
    )
}

/// Turn a field name such as `age` or `address.city` into a JSON path.
///
/// Paths already starting with `$` are returned unchanged.
pub fn json_path(field: &str) -> String {
    if field.starts_with('$') {
        field.to_string()
    } else {
        format!("$.{}", field)
    }
}
