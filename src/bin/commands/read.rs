use clap::Args;
use serde_json::json;
use sqlmanager::{AccessorError, ColumnData, RowAccessor, RowId};

use super::print_json;

/// Arguments for the Exists command
#[derive(Args)]
pub struct ExistsArgs {
    /// Row id; numbers are matched as integers, anything else as text
    #[clap(value_name = "ID")]
    pub id: String,
}

/// Arguments for the Get command
#[derive(Args)]
pub struct GetArgs {
    /// Column to read
    #[clap(value_name = "COLUMN")]
    pub column: String,

    /// Row id
    #[clap(value_name = "ID")]
    pub id: String,

    /// Extract a field from a JSON column, e.g. `age` or `address.city`
    #[clap(short, long)]
    pub field: Option<String>,
}

/// Arguments for the GetJson command
#[derive(Args)]
pub struct GetJsonArgs {
    /// JSON column to read
    #[clap(value_name = "COLUMN")]
    pub column: String,

    /// Row id
    #[clap(value_name = "ID")]
    pub id: String,

    /// Pretty-print JSON output
    #[clap(long)]
    pub pretty: bool,
}

pub fn run_exists(
    accessor: &RowAccessor,
    args: ExistsArgs,
    json_output: bool,
) -> Result<(), AccessorError> {
    let id = RowId::parse(&args.id);
    let exists = accessor.exists(&id)?;

    if json_output {
        print_json(
            &json!({"table": accessor.table_name(), "id": id, "exists": exists}),
            false,
        );
    } else {
        println!("{}", exists);
    }
    Ok(())
}

pub fn run_get(
    accessor: &RowAccessor,
    args: GetArgs,
    json_output: bool,
) -> Result<(), AccessorError> {
    let GetArgs { column, id, field } = args;
    let id = RowId::parse(&id);

    let value: ColumnData = match &field {
        Some(field) => accessor.read_json_field(&column, field, &id)?,
        None => accessor.read_value(&column, &id)?,
    };

    if json_output {
        print_json(
            &json!({
                "id": id,
                "column": column,
                "field": field,
                "type": value.type_name(),
                "value": value,
            }),
            false,
        );
    } else {
        println!("{}", value);
    }
    Ok(())
}

pub fn run_get_json(accessor: &RowAccessor, args: GetJsonArgs) -> Result<(), AccessorError> {
    let id = RowId::parse(&args.id);
    let value: serde_json::Value = accessor.read_struct_as_json(&args.column, &id)?;
    print_json(&value, args.pretty);
    Ok(())
}
