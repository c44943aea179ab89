use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Open (creating if needed) the library database at `path` and make sure the
/// schema exists. The parent directory is created on first run.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    ensure_schema(&conn)?;
    log::info!("library database ready at {}", path.display());
    Ok(conn)
}

/// Fresh private database, used by tests and as a scratch store.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Run lazy migrations. Foreign keys are switched on so a log row can never
/// point at a book or client that does not exist; the cascade on delete is
/// still done by the application.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            bid INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0)
        )",
        [],
    )
    .context("failed to create books table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS clients (
            cid INTEGER PRIMARY KEY AUTOINCREMENT,
            fname TEXT NOT NULL,
            lname TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create clients table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS logs (
            lid INTEGER PRIMARY KEY AUTOINCREMENT,
            bid INTEGER NOT NULL,
            cid INTEGER NOT NULL,
            ltype TEXT NOT NULL CHECK (ltype IN ('Borrowing', 'Returning')),
            ldate TIMESTAMP NOT NULL,
            FOREIGN KEY(bid) REFERENCES books(bid),
            FOREIGN KEY(cid) REFERENCES clients(cid)
        )",
        [],
    )
    .context("failed to create logs table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_logs_ldate ON logs(ldate DESC)",
        [],
    )
    .context("failed to create logs index")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creation_is_idempotent() {
        let conn = open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('books', 'clients', 'logs') ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(tables, ["books", "clients", "logs"]);
    }

    #[test]
    fn stock_check_rejects_negative_values() {
        let conn = open_in_memory().unwrap();
        let err = conn.execute(
            "INSERT INTO books (title, stock) VALUES ('Dune', -1)",
            [],
        );
        assert!(err.is_err());
    }

    #[test]
    fn open_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("library.sqlite");
        let conn = open(&path).unwrap();
        drop(conn);
        assert!(path.exists());
    }
}
