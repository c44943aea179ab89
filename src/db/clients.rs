use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{LedgerError, Result};
use crate::models::Client;

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
    })
}

pub fn fetch_clients(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt = conn.prepare("SELECT cid, fname, lname FROM clients ORDER BY cid")?;
    let clients = stmt
        .query_map([], client_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(clients)
}

pub fn fetch_client(conn: &Connection, id: i64) -> Result<Option<Client>> {
    let client = conn
        .query_row(
            "SELECT cid, fname, lname FROM clients WHERE cid = ?1",
            [id],
            client_from_row,
        )
        .optional()?;
    Ok(client)
}

pub fn create_client(conn: &Connection, first_name: &str, last_name: &str) -> Result<Client> {
    conn.execute(
        "INSERT INTO clients (fname, lname) VALUES (?1, ?2)",
        params![first_name, last_name],
    )?;

    Ok(Client {
        id: conn.last_insert_rowid(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    })
}

pub fn update_client(conn: &Connection, id: i64, first_name: &str, last_name: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE clients SET fname = ?1, lname = ?2 WHERE cid = ?3",
        params![first_name, last_name, id],
    )?;

    if updated == 0 {
        Err(LedgerError::NotFound {
            entity: "client",
            id,
        })
    } else {
        Ok(())
    }
}

/// Remove a client and every transaction that names them.
pub fn delete_client(conn: &mut Connection, id: i64) -> Result<usize> {
    let tx = conn.transaction()?;
    let logs_removed = tx.execute("DELETE FROM logs WHERE cid = ?1", [id])?;
    let deleted = tx.execute("DELETE FROM clients WHERE cid = ?1", [id])?;

    if deleted == 0 {
        return Err(LedgerError::NotFound {
            entity: "client",
            id,
        });
    }

    tx.commit()?;
    Ok(logs_removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;

    #[test]
    fn update_changes_both_names() {
        let conn = open_in_memory().unwrap();
        let ann = create_client(&conn, "Ann", "Lee").unwrap();
        update_client(&conn, ann.id, "Anna", "Li").unwrap();

        let stored = fetch_client(&conn, ann.id).unwrap().unwrap();
        assert_eq!(stored.full_name(), "Anna Li");
    }

    #[test]
    fn fetch_unknown_client_is_none() {
        let conn = open_in_memory().unwrap();
        assert_eq!(fetch_client(&conn, 3).unwrap(), None);
    }
}
