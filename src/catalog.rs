//! The record cache behind the list view.
//!
//! [`Catalog`] owns the database connection and keeps an ordered copy of the
//! rows for the active [`Mode`]. Searching narrows that copy in memory: the
//! first non-empty search stashes the full list as a snapshot, every later
//! search filters the snapshot again from scratch, and an empty search puts the
//! snapshot back. The store is never queried while typing.
//!
//! All mutations go through the catalog so the store and the cached rows move
//! together. They are addressed by entity id, never by row position.

use std::sync::mpsc::{channel, Receiver, Sender};

use rusqlite::Connection;

use crate::db;
use crate::error::Result;
use crate::models::{Book, Client, Column, LogEntry, Mode, Record, TransactionKind};

/// Sent to every subscriber whenever the visible rows change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentsChanged {
    pub mode: Mode,
    pub count: usize,
}

/// Parse a stock figure typed by the user. Anything that is not an integer
/// becomes zero, which the add/edit operations then reject.
pub fn coerce_stock(raw: &str) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(stock) => stock,
        Err(err) => {
            log::debug!("stock {raw:?} is not an integer ({err}), using 0");
            0
        }
    }
}

pub struct Catalog {
    conn: Connection,
    mode: Mode,
    items: Vec<Record>,
    /// Full result of the last fetch while a filter is active, empty otherwise.
    snapshot: Vec<Record>,
    /// Lower-cased predicate of the active filter.
    filter: Option<String>,
    listeners: Vec<Sender<ContentsChanged>>,
}

impl Catalog {
    /// Wrap an open connection. Nothing is loaded until the first
    /// [`Catalog::switch_mode`] or [`Catalog::fetch`].
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            mode: Mode::Book,
            items: Vec::new(),
            snapshot: Vec::new(),
            filter: None,
            listeners: Vec::new(),
        }
    }

    /// Read access for pickers that need rows outside the active mode.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn subscribe(&mut self) -> Receiver<ContentsChanged> {
        let (tx, rx) = channel();
        self.listeners.push(tx);
        rx
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn columns(&self) -> &'static [Column] {
        self.mode.columns()
    }

    pub fn items(&self) -> &[Record] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_filtering(&self) -> bool {
        self.filter.is_some()
    }

    pub fn record(&self, row: usize) -> Option<&Record> {
        self.items.get(row)
    }

    /// Entity id behind a visible row.
    pub fn id_at(&self, row: usize) -> Option<i64> {
        self.items.get(row).map(Record::id)
    }

    /// Row at which the given id is currently shown.
    pub fn position_of(&self, id: i64) -> Option<usize> {
        self.items.iter().position(|record| record.id() == id)
    }

    /// Replace the cached rows with a fresh query for the current mode and drop
    /// any filter.
    pub fn fetch(&mut self) -> Result<()> {
        self.items = match self.mode {
            Mode::Book => db::fetch_books(&self.conn)?
                .into_iter()
                .map(Record::Book)
                .collect(),
            Mode::Client => db::fetch_clients(&self.conn)?
                .into_iter()
                .map(Record::Client)
                .collect(),
            Mode::Log => db::fetch_logs(&self.conn)?
                .into_iter()
                .map(Record::Log)
                .collect(),
        };
        self.snapshot.clear();
        self.filter = None;
        Ok(())
    }

    pub fn switch_mode(&mut self, mode: Mode) -> Result<()> {
        self.mode = mode;
        self.fetch()?;
        log::debug!("loaded {} {} row(s)", self.items.len(), mode.label());
        self.notify();
        Ok(())
    }

    /// Reload the active mode from the store.
    pub fn refresh(&mut self) -> Result<()> {
        self.switch_mode(self.mode)
    }

    /// Filter the cached rows by a case-insensitive substring of first name,
    /// last name or title. An empty predicate restores the unfiltered rows.
    pub fn search(&mut self, predicate: &str) {
        if predicate.is_empty() {
            if self.filter.take().is_some() {
                self.items = std::mem::take(&mut self.snapshot);
                self.notify();
            }
            return;
        }

        if self.filter.is_none() {
            self.snapshot = std::mem::take(&mut self.items);
        }

        self.filter = Some(predicate.to_lowercase());
        self.refilter();
        self.notify();
    }

    /// Add a book. Returns `None` without touching the store when the title is
    /// blank or the stock is not positive.
    pub fn add_book(&mut self, title: &str, stock: i64) -> Result<Option<Book>> {
        let title = title.trim();
        if title.is_empty() || stock <= 0 {
            log::debug!("add book skipped: title {title:?}, stock {stock}");
            return Ok(None);
        }

        let book = db::create_book(&self.conn, title, stock)?;
        log::info!("added book {} ({:?}, stock {})", book.id, book.title, book.stock);
        if self.mode == Mode::Book {
            self.insert_record(Record::Book(book.clone()), false);
        }
        self.notify();
        Ok(Some(book))
    }

    /// Rewrite a book's title and stock. Returns `false` for a blank title or a
    /// negative stock. A stock of 0 is accepted here, unlike in
    /// [`Catalog::add_book`], so the last copy can be written off.
    pub fn edit_book(&mut self, id: i64, title: &str, stock: i64) -> Result<bool> {
        let title = title.trim();
        if title.is_empty() || stock < 0 {
            log::debug!("edit book {id} skipped: title {title:?}, stock {stock}");
            return Ok(false);
        }

        db::update_book(&self.conn, id, title, stock)?;
        log::info!("updated book {id}");
        self.update_records(|record| match record {
            Record::Book(book) if book.id == id => {
                book.title = title.to_string();
                book.stock = stock;
            }
            Record::Log(entry) if entry.book_id == id => entry.title = Some(title.to_string()),
            _ => {}
        });
        self.refilter();
        self.notify();
        Ok(true)
    }

    /// Delete a book and every transaction that references it.
    pub fn delete_book(&mut self, id: i64) -> Result<()> {
        let logs_removed = db::delete_book(&mut self.conn, id)?;
        log::info!("deleted book {id} and {logs_removed} transaction(s)");
        self.remove_records(|record| match record {
            Record::Book(book) => book.id == id,
            Record::Log(entry) => entry.book_id == id,
            Record::Client(_) => false,
        });
        self.notify();
        Ok(())
    }

    pub fn add_client(&mut self, first_name: &str, last_name: &str) -> Result<Option<Client>> {
        let (first_name, last_name) = (first_name.trim(), last_name.trim());
        if first_name.is_empty() || last_name.is_empty() {
            log::debug!("add client skipped: {first_name:?} {last_name:?}");
            return Ok(None);
        }

        let client = db::create_client(&self.conn, first_name, last_name)?;
        log::info!("added client {} ({})", client.id, client.full_name());
        if self.mode == Mode::Client {
            self.insert_record(Record::Client(client.clone()), false);
        }
        self.notify();
        Ok(Some(client))
    }

    pub fn edit_client(&mut self, id: i64, first_name: &str, last_name: &str) -> Result<bool> {
        let (first_name, last_name) = (first_name.trim(), last_name.trim());
        if first_name.is_empty() || last_name.is_empty() {
            log::debug!("edit client {id} skipped: {first_name:?} {last_name:?}");
            return Ok(false);
        }

        db::update_client(&self.conn, id, first_name, last_name)?;
        log::info!("updated client {id}");
        self.update_records(|record| match record {
            Record::Client(client) if client.id == id => {
                client.first_name = first_name.to_string();
                client.last_name = last_name.to_string();
            }
            Record::Log(entry) if entry.client_id == id => {
                entry.first_name = Some(first_name.to_string());
                entry.last_name = Some(last_name.to_string());
            }
            _ => {}
        });
        self.refilter();
        self.notify();
        Ok(true)
    }

    pub fn delete_client(&mut self, id: i64) -> Result<()> {
        let logs_removed = db::delete_client(&mut self.conn, id)?;
        log::info!("deleted client {id} and {logs_removed} transaction(s)");
        self.remove_records(|record| match record {
            Record::Client(client) => client.id == id,
            Record::Log(entry) => entry.client_id == id,
            Record::Book(_) => false,
        });
        self.notify();
        Ok(())
    }

    /// Record a borrowing or a return. A borrowing against an empty shelf
    /// fails with [`crate::LedgerError::OutOfStock`] and writes nothing.
    pub fn record_transaction(
        &mut self,
        book_id: i64,
        client_id: i64,
        kind: TransactionKind,
    ) -> Result<LogEntry> {
        let entry = match db::record_transaction(&mut self.conn, book_id, client_id, kind) {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("transaction on book {book_id} rejected: {err}");
                return Err(err);
            }
        };
        log::info!("recorded {} of book {book_id} by client {client_id}", kind);

        match self.mode {
            Mode::Book => {
                let delta = kind.stock_delta();
                self.update_records(|record| {
                    if let Record::Book(book) = record {
                        if book.id == book_id {
                            book.stock = book.stock.saturating_add(delta);
                        }
                    }
                });
            }
            Mode::Log => self.insert_record(Record::Log(entry.clone()), true),
            Mode::Client => {}
        }
        self.notify();
        Ok(entry)
    }

    /// Remove one transaction from the history. The book's stock is not
    /// adjusted back.
    pub fn delete_transaction(&mut self, id: i64) -> Result<()> {
        db::delete_log(&self.conn, id)?;
        log::info!("deleted transaction {id}");
        self.remove_records(|record| matches!(record, Record::Log(entry) if entry.id == id));
        self.notify();
        Ok(())
    }

    /// Rebuild the visible rows from the snapshot while a filter is active.
    fn refilter(&mut self) {
        if let Some(needle) = self.filter.as_deref() {
            self.items = self
                .snapshot
                .iter()
                .filter(|record| record.matches(needle))
                .cloned()
                .collect();
        }
    }

    /// Place a new record at the end (or the front for the newest-first
    /// history). While filtering it always joins the snapshot but is only shown
    /// if it matches the filter.
    fn insert_record(&mut self, record: Record, front: bool) {
        let visible = self
            .filter
            .as_deref()
            .map_or(true, |needle| record.matches(needle));

        if self.filter.is_some() {
            push(&mut self.snapshot, record.clone(), front);
        }
        if visible {
            push(&mut self.items, record, front);
        }
    }

    /// Apply an in-place change to every cached record, visible or stashed.
    fn update_records<F>(&mut self, mut apply: F)
    where
        F: FnMut(&mut Record),
    {
        self.items
            .iter_mut()
            .chain(self.snapshot.iter_mut())
            .for_each(|record| apply(record));
    }

    fn remove_records<F>(&mut self, doomed: F)
    where
        F: Fn(&Record) -> bool,
    {
        self.items.retain(|record| !doomed(record));
        self.snapshot.retain(|record| !doomed(record));
    }

    fn notify(&mut self) {
        let event = ContentsChanged {
            mode: self.mode,
            count: self.items.len(),
        };
        self.listeners.retain(|listener| listener.send(event).is_ok());
    }
}

fn push(list: &mut Vec<Record>, record: Record, front: bool) {
    if front {
        list.insert(0, record);
    } else {
        list.push(record);
    }
}
