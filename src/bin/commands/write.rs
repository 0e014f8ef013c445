use clap::Args;
use serde_json::json;
use sqlmanager::{AccessorError, RowAccessor, RowId};

use super::{parse_json_value, parse_value, print_json};

/// Arguments for the Set command
#[derive(Args)]
pub struct SetArgs {
    /// Column to update
    #[clap(value_name = "COLUMN")]
    pub column: String,

    /// Row id
    #[clap(value_name = "ID")]
    pub id: String,

    /// New value. Without --field: integer, float, NULL or text.
    /// With --field: any JSON value, bare words are stored as JSON strings.
    #[clap(value_name = "VALUE")]
    pub value: String,

    /// Set a single field inside a JSON column instead of the whole column
    #[clap(short, long)]
    pub field: Option<String>,
}

/// Arguments for the SetJson command
#[derive(Args)]
pub struct SetJsonArgs {
    /// JSON column to replace
    #[clap(value_name = "COLUMN")]
    pub column: String,

    /// Row id
    #[clap(value_name = "ID")]
    pub id: String,

    /// JSON document to store
    #[clap(value_name = "JSON")]
    pub json: String,
}

/// Arguments for the Exec command
#[derive(Args)]
pub struct ExecArgs {
    /// SQL statement with ?1, ?2, ... placeholders
    #[clap(value_name = "SQL")]
    pub sql: String,

    /// Positional parameters, interpreted like `set` values
    #[clap(value_name = "PARAMS")]
    pub params: Vec<String>,
}

pub fn run_set(
    accessor: &RowAccessor,
    args: SetArgs,
    json_output: bool,
) -> Result<(), AccessorError> {
    let SetArgs {
        column,
        id,
        value,
        field,
    } = args;
    let id = RowId::parse(&id);

    let changed = match &field {
        Some(field) => {
            accessor.update_json_field(&id, field, &column, &parse_json_value(&value))?
        }
        None => accessor.update_column(&id, &column, parse_value(&value))?,
    };

    print_changed(changed, json_output);
    Ok(())
}

pub fn run_set_json(
    accessor: &RowAccessor,
    args: SetJsonArgs,
    json_output: bool,
) -> Result<(), AccessorError> {
    let document: serde_json::Value = serde_json::from_str(&args.json)
        .map_err(|e| AccessorError::Serialization(format!("Invalid JSON argument: {}", e)))?;
    let id = RowId::parse(&args.id);

    let changed = accessor.write_json(&id, &args.column, &document)?;
    print_changed(changed, json_output);
    Ok(())
}

pub fn run_exec(
    accessor: &RowAccessor,
    args: ExecArgs,
    json_output: bool,
) -> Result<(), AccessorError> {
    let values: Vec<_> = args.params.iter().map(|p| parse_value(p)).collect();
    let changed = accessor.execute(&args.sql, rusqlite::params_from_iter(values.iter()))?;
    print_changed(changed, json_output);
    Ok(())
}

fn print_changed(changed: usize, json_output: bool) {
    if json_output {
        print_json(&json!({ "rows_changed": changed }), false);
    } else if changed == 0 {
        println!("no rows changed");
    } else {
        println!("{} row(s) changed", changed);
    }
}
