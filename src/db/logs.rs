use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::books::book_from_row;
use crate::error::{LedgerError, Result};
use crate::models::{LogEntry, TransactionKind};

/// Shared projection for the history view: each log row joined with the book
/// title and client names it references.
const LOG_SELECT: &str = "SELECT l.lid, l.bid, l.cid, l.ltype, l.ldate, b.title, c.fname, c.lname
     FROM logs l
     LEFT JOIN books b ON b.bid = l.bid
     LEFT JOIN clients c ON c.cid = l.cid";

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    Ok(LogEntry {
        id: row.get(0)?,
        book_id: row.get(1)?,
        client_id: row.get(2)?,
        kind: row.get(3)?,
        timestamp: row.get(4)?,
        title: row.get(5)?,
        first_name: row.get(6)?,
        last_name: row.get(7)?,
    })
}

/// Full transaction history, most recent first. Rows recorded within the same
/// second fall back to insertion order.
pub fn fetch_logs(conn: &Connection) -> Result<Vec<LogEntry>> {
    let mut stmt = conn.prepare(&format!("{LOG_SELECT} ORDER BY l.ldate DESC, l.lid DESC"))?;
    let logs = stmt
        .query_map([], log_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(logs)
}

pub fn fetch_log(conn: &Connection, id: i64) -> Result<Option<LogEntry>> {
    let entry = conn
        .query_row(&format!("{LOG_SELECT} WHERE l.lid = ?1"), [id], log_from_row)
        .optional()?;
    Ok(entry)
}

/// Record a borrowing or a return and move the book's stock accordingly.
///
/// The stock is read from the store, not from any cached copy. Reading it,
/// inserting the log row and writing the new stock share one transaction. A
/// borrowing against an empty shelf fails with [`LedgerError::OutOfStock`]
/// and a return that would overflow the stock with
/// [`LedgerError::StockOverflow`], both before anything is written.
pub fn record_transaction(
    conn: &mut Connection,
    book_id: i64,
    client_id: i64,
    kind: TransactionKind,
) -> Result<LogEntry> {
    let tx = conn.transaction()?;

    let book = tx
        .query_row(
            "SELECT bid, title, stock FROM books WHERE bid = ?1",
            [book_id],
            book_from_row,
        )
        .optional()?
        .ok_or(LedgerError::NotFound {
            entity: "book",
            id: book_id,
        })?;

    let client_exists: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM clients WHERE cid = ?1)",
        [client_id],
        |row| row.get(0),
    )?;
    if !client_exists {
        return Err(LedgerError::NotFound {
            entity: "client",
            id: client_id,
        });
    }

    if kind == TransactionKind::Borrowing && book.stock <= 0 {
        return Err(LedgerError::OutOfStock {
            book_id,
            title: book.title,
        });
    }

    let new_stock = book
        .stock
        .checked_add(kind.stock_delta())
        .ok_or_else(|| LedgerError::StockOverflow {
            book_id,
            title: book.title.clone(),
        })?;

    tx.execute(
        "INSERT INTO logs (bid, cid, ltype, ldate) VALUES (?1, ?2, ?3, DATETIME('now'))",
        params![book_id, client_id, kind],
    )?;
    let lid = tx.last_insert_rowid();

    tx.execute(
        "UPDATE books SET stock = ?1 WHERE bid = ?2",
        params![new_stock, book_id],
    )?;

    let entry = fetch_log(&tx, lid)?.ok_or(LedgerError::NotFound {
        entity: "transaction",
        id: lid,
    })?;

    tx.commit()?;
    Ok(entry)
}

/// Drop one history row. The book's stock is left as it is.
pub fn delete_log(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM logs WHERE lid = ?1", [id])?;

    if deleted == 0 {
        Err(LedgerError::NotFound {
            entity: "transaction",
            id,
        })
    } else {
        Ok(())
    }
}

pub fn count_logs(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?)
}
