//! Where the application keeps its files.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-ledger";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";
/// Log file written next to the database.
const LOG_FILE_NAME: &str = "library-ledger.log";
/// Environment variable that overrides the database location.
pub const DB_ENV_VAR: &str = "LIBRARY_LEDGER_DB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    /// Resolve paths from the process arguments and environment. The first
    /// argument wins over `LIBRARY_LEDGER_DB`, which wins over the default
    /// under the home directory.
    pub fn from_env() -> Result<Self> {
        let default_dir = || -> Result<PathBuf> {
            let base_dirs =
                BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
            Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
        };
        Self::resolve(env::args_os().nth(1), env::var_os(DB_ENV_VAR), default_dir)
    }

    fn resolve<F>(arg: Option<OsString>, var: Option<OsString>, default_dir: F) -> Result<Self>
    where
        F: FnOnce() -> Result<PathBuf>,
    {
        let db_path = match arg.or(var).filter(|path| !path.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_dir()?.join(DB_FILE_NAME),
        };
        let log_path = db_path.with_file_name(LOG_FILE_NAME);
        Ok(Self { db_path, log_path })
    }
}
