//! Binary entry point: resolve paths, start logging, open the store, and drive
//! the Ratatui event loop until the user quits.
use std::fs::{self, OpenOptions};

use anyhow::{Context, Result};
use env_logger::{Env, Target};

use library_ledger::{db, run_app, App, Catalog, Config};

/// Send log output to the file next to the database. `RUST_LOG` picks the
/// level, `info` by default.
fn init_logging(config: &Config) -> Result<()> {
    if let Some(parent) = config.log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("failed to open log file {}", config.log_path.display()))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config)?;

    let conn = db::open(&config.db_path)?;
    let mut app = App::new(Catalog::new(conn))?;
    run_app(&mut app)
}
