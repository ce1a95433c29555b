//! Backend configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

/// Default database name.
pub const DEFAULT_DATABASE: &str = "casper-events";

/// Default time SQLite waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for opening a [`SqliteBackend`](crate::SqliteBackend).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Logical database name; also the file stem on disk.
    pub database: String,
    /// Directory holding the database file. `None` opens an in-memory database.
    pub data_dir: Option<PathBuf>,
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            data_dir: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// On-disk config rooted at `data_dir`.
    pub fn on_disk(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Path of the database file, or `None` for an in-memory database.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.db", self.database)))
    }

    /// Read configuration from the environment.
    ///
    /// - `EVENT_AUDIT_DATABASE`: database name
    /// - `EVENT_AUDIT_DATA_DIR`: directory for the database file
    /// - `EVENT_AUDIT_BUSY_TIMEOUT_MS`: busy timeout in milliseconds
    ///
    /// Unset or empty variables fall back to the defaults; a value that does
    /// not parse is an error.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    fn load(source: Option<::config::Map<String, String>>) -> Result<Self> {
        let env = ::config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .ignore_empty(true)
            .source(source);
        let raw: EnvConfig = ::config::Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()?;

        let defaults = Self::default();
        Ok(Self {
            database: raw.database.unwrap_or(defaults.database),
            data_dir: raw.data_dir,
            busy_timeout: raw
                .busy_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.busy_timeout),
        })
    }
}

/// Environment variable prefix.
const ENV_PREFIX: &str = "EVENT_AUDIT";

/// Variables as read from the environment, before defaults apply.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvConfig {
    database: Option<String>,
    data_dir: Option<PathBuf>,
    busy_timeout_ms: Option<u64>,
}
