use anyhow::{anyhow, Result};
use config::Config;
use rusqlite::OpenFlags;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Database location that selects an in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// Default busy timeout in seconds
const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

pub struct SqlManagerConfig {
    /// Path to the SQLite database file, or `:memory:`
    pub database_path: String,

    /// Descriptive database name, reported in logs only
    pub database_name: String,

    /// Table targeted by the row accessor
    pub table_name: String,

    /// How long to wait on a locked database before failing (default: 5 seconds)
    pub busy_timeout_secs: u64,

    /// Open the database read-only
    pub read_only: bool,
}

const EMPTY_CONFIG: &str = r#"### sqlmanager configuration file

### SQLite database file, use ":memory:" for a throwaway database
# database_path = "~/.sqlmanager/sqlmanager.sqlite3"

### descriptive database name
# database_name = "main"

### table that row operations target
# table_name = "clients"

### connection settings
# busy_timeout_secs = 5
# read_only = false
"#;

impl Default for SqlManagerConfig {
    fn default() -> Self {
        let dir = default_dir().unwrap_or_else(|_| "./.sqlmanager".to_string());

        Self {
            database_path: format!("{}/sqlmanager.sqlite3", dir),
            database_name: "main".to_string(),
            table_name: "clients".to_string(),
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT_SECS,
            read_only: false,
        }
    }
}

impl SqlManagerConfig {
    /// Load the configuration from `path`, or from
    /// `$HOME/.sqlmanager/sqlmanager.toml` when no path is given
    ///
    /// A missing file is created from a commented template and the defaults
    /// apply. `SQLMANAGER_*` environment variables override file values.
    pub fn new(path: &Option<String>) -> Result<SqlManagerConfig> {
        let file = match path {
            Some(p) => p.clone(),
            None => {
                let dir = default_dir()?;
                std::fs::create_dir_all(&dir)
                    .map_err(|e| anyhow!("Unable to create directory {}: {}", dir, e))?;
                format!("{}/sqlmanager.toml", dir)
            }
        };
        Self::load(&file)
    }

    fn load(file: &str) -> Result<SqlManagerConfig> {
        let mut builder = Config::builder();

        if Path::new(file).exists() {
            builder = builder.add_source(config::File::new(file, config::FileFormat::Toml));
        } else {
            std::fs::write(file, EMPTY_CONFIG)
                .map_err(|e| anyhow!("Unable to create config file {}: {}", file, e))?;
        }

        // E.g., `SQLMANAGER_TABLE_NAME=users ./sqlmanager exists 1` targets the users table
        builder = builder.add_source(config::Environment::with_prefix("SQLMANAGER"));

        let values = builder
            .build()
            .and_then(|settings| settings.try_deserialize::<HashMap<String, String>>())
            .map_err(|e| anyhow!("Failed to load configuration from {}: {}", file, e))?;

        Self::from_map(&values)
    }

    fn from_map(config: &HashMap<String, String>) -> Result<SqlManagerConfig> {
        let defaults = SqlManagerConfig::default();

        let database_path = match config.get("database_path") {
            Some(p) if p == IN_MEMORY => p.clone(),
            Some(p) => expand_home(p)?,
            None => defaults.database_path,
        };

        let busy_timeout_secs = match config.get("busy_timeout_secs") {
            Some(s) => s
                .parse()
                .map_err(|e| anyhow!("Invalid busy_timeout_secs '{}': {}", s, e))?,
            None => defaults.busy_timeout_secs,
        };

        let read_only = match config.get("read_only") {
            Some(s) => s
                .parse()
                .map_err(|e| anyhow!("Invalid read_only '{}': {}", s, e))?,
            None => defaults.read_only,
        };

        Ok(SqlManagerConfig {
            database_path,
            database_name: config
                .get("database_name")
                .cloned()
                .unwrap_or(defaults.database_name),
            table_name: config
                .get("table_name")
                .cloned()
                .unwrap_or(defaults.table_name),
            busy_timeout_secs,
            read_only,
        })
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        match default_dir() {
            Ok(dir) => format!("{}/sqlmanager.toml", dir),
            Err(_) => "~/.sqlmanager/sqlmanager.toml".to_string(),
        }
    }

    /// Get busy timeout as Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    /// Connection options described by this configuration
    pub fn connection_options(&self) -> ConnectionOptions {
        let path = if self.database_path == IN_MEMORY {
            None
        } else {
            Some(self.database_path.clone())
        };

        ConnectionOptions {
            path,
            read_only: self.read_only,
            busy_timeout: self.busy_timeout(),
            ..Default::default()
        }
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        [
            format!("Database Path:      {}", self.database_path),
            format!("Database Name:      {}", self.database_name),
            format!("Table Name:         {}", self.table_name),
            format!("Busy Timeout:       {} seconds", self.busy_timeout_secs),
            format!("Read Only:          {}", self.read_only),
        ]
        .join("\n")
    }
}

fn home_dir() -> Result<String> {
    dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not find home directory"))?
        .to_str()
        .map(str::to_owned)
        .ok_or_else(|| anyhow!("Could not convert home directory path to string"))
}

fn default_dir() -> Result<String> {
    Ok(format!("{}/.sqlmanager", home_dir()?))
}

/// Replace a leading `~/` with the home directory
fn expand_home(path: &str) -> Result<String> {
    match path.strip_prefix("~/") {
        Some(rest) => Ok(format!("{}/{}", home_dir()?, rest)),
        None => Ok(path.to_string()),
    }
}

/// Parameters used to open a connection
///
/// `path: None` opens a private in-memory database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub path: Option<String>,
    pub read_only: bool,
    pub create_if_missing: bool,
    pub busy_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            path: None,
            read_only: false,
            create_if_missing: true,
            busy_timeout: Duration::from_secs(DEFAULT_BUSY_TIMEOUT_SECS),
        }
    }
}

impl ConnectionOptions {
    /// Options for an in-memory database
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Options for a database file at `path`
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Human-readable location, used in log and error messages
    pub fn location(&self) -> &str {
        self.path.as_deref().unwrap_or(IN_MEMORY)
    }

    pub(crate) fn open_flags(&self) -> OpenFlags {
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if self.create_if_missing {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }
        flags
    }
}
