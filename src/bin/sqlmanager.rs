use clap::{Parser, Subcommand};
use sqlmanager::{AccessorError, RowAccessor, SqlManagerConfig};
use tracing::Level;

mod commands;

/// Level installed by `--debug`; per-statement logs are emitted at DEBUG
const DEBUG_LEVEL: Level = Level::DEBUG;

use commands::read::{ExistsArgs, GetArgs, GetJsonArgs};
use commands::write::{ExecArgs, SetArgs, SetJsonArgs};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.sqlmanager/sqlmanager.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// SQLite database file, overrides the configured database_path
    #[clap(short, long, global = true)]
    database: Option<String>,

    /// Table to operate on, overrides the configured table_name
    #[clap(short, long, global = true)]
    table: Option<String>,

    /// Output as JSON objects
    #[clap(long, global = true)]
    json: bool,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a row with the given id exists
    Exists(ExistsArgs),

    /// Read a column, or a field of a JSON column, for one row
    Get(GetArgs),

    /// Read a JSON column as a whole document
    GetJson(GetJsonArgs),

    /// Update a column, or a field of a JSON column, for one row
    Set(SetArgs),

    /// Replace a JSON column with a new document
    SetJson(SetJsonArgs),

    /// Execute an arbitrary SQL statement
    Exec(ExecArgs),

    /// Show the effective configuration
    Config,
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            // filter spans/events with level DEBUG or higher.
            .with_max_level(DEBUG_LEVEL)
            .init();
    }

    let mut config = match SqlManagerConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if let Some(table) = cli.table {
        config.table_name = table;
    }

    if let Commands::Config = cli.command {
        commands::config::run(&config, cli.json);
        return;
    }

    let mut accessor = match RowAccessor::from_config(&config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let result = run_command(&accessor, cli.command, cli.json);
    let closed = accessor.close();

    if let Err(e) = result.and(closed) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_command(
    accessor: &RowAccessor,
    command: Commands,
    json: bool,
) -> Result<(), AccessorError> {
    match command {
        Commands::Exists(args) => commands::read::run_exists(accessor, args, json),
        Commands::Get(args) => commands::read::run_get(accessor, args, json),
        Commands::GetJson(args) => commands::read::run_get_json(accessor, args),
        Commands::Set(args) => commands::write::run_set(accessor, args, json),
        Commands::SetJson(args) => commands::write::run_set_json(accessor, args, json),
        Commands::Exec(args) => commands::write::run_exec(accessor, args, json),
        Commands::Config => Ok(()),
    }
}
