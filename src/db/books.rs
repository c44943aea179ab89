use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{LedgerError, Result};
use crate::models::Book;

pub(crate) fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        stock: row.get(2)?,
    })
}

/// Every book in insertion order, which is the order the book list shows.
pub fn fetch_books(conn: &Connection) -> Result<Vec<Book>> {
    let mut stmt = conn.prepare("SELECT bid, title, stock FROM books ORDER BY bid")?;
    let books = stmt
        .query_map([], book_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(books)
}

pub fn fetch_book(conn: &Connection, id: i64) -> Result<Option<Book>> {
    let book = conn
        .query_row(
            "SELECT bid, title, stock FROM books WHERE bid = ?1",
            [id],
            book_from_row,
        )
        .optional()?;
    Ok(book)
}

/// Insert a new book and echo the hydrated struct, id included, so the caller
/// can push it straight into the cached list.
pub fn create_book(conn: &Connection, title: &str, stock: i64) -> Result<Book> {
    conn.execute(
        "INSERT INTO books (title, stock) VALUES (?1, ?2)",
        params![title, stock],
    )?;

    Ok(Book {
        id: conn.last_insert_rowid(),
        title: title.to_string(),
        stock,
    })
}

pub fn update_book(conn: &Connection, id: i64, title: &str, stock: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE books SET title = ?1, stock = ?2 WHERE bid = ?3",
        params![title, stock, id],
    )?;

    if updated == 0 {
        Err(LedgerError::NotFound { entity: "book", id })
    } else {
        Ok(())
    }
}

/// Remove a book together with its transaction history. Both deletes share one
/// transaction; an unknown id rolls everything back.
pub fn delete_book(conn: &mut Connection, id: i64) -> Result<usize> {
    let tx = conn.transaction()?;
    let logs_removed = tx.execute("DELETE FROM logs WHERE bid = ?1", [id])?;
    let deleted = tx.execute("DELETE FROM books WHERE bid = ?1", [id])?;

    if deleted == 0 {
        return Err(LedgerError::NotFound { entity: "book", id });
    }

    tx.commit()?;
    Ok(logs_removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;

    #[test]
    fn create_then_fetch_preserves_insert_order() {
        let conn = open_in_memory().unwrap();
        let dune = create_book(&conn, "Dune", 2).unwrap();
        let emma = create_book(&conn, "Emma", 1).unwrap();
        assert!(emma.id > dune.id);

        let books = fetch_books(&conn).unwrap();
        assert_eq!(books, vec![dune, emma]);
    }

    #[test]
    fn update_missing_book_is_not_found() {
        let conn = open_in_memory().unwrap();
        let err = update_book(&conn, 99, "Ghost", 1).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity: "book", id: 99 }));
    }

    #[test]
    fn delete_missing_book_is_not_found() {
        let mut conn = open_in_memory().unwrap();
        assert!(matches!(
            delete_book(&mut conn, 5),
            Err(LedgerError::NotFound { .. })
        ));
    }
}
