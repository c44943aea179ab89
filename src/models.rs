//! Domain models that mirror the SQLite schema and get passed throughout the
//! catalog and the TUI. These stay light-weight data holders; the persistence
//! layer fills them and the catalog decides which of them are visible.

use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A title the library owns, together with how many copies are on the shelf.
pub struct Book {
    /// Primary key (`bid`) from the database.
    pub id: i64,
    pub title: String,
    /// Copies currently available. Never negative.
    pub stock: i64,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A registered library member.
pub struct Client {
    /// Primary key (`cid`) from the database.
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Client {
    /// `First Last`, the form used by pickers and confirmation prompts.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Direction of a transaction. Borrowing takes a copy off the shelf, returning
/// puts one back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Borrowing,
    Returning,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 2] = [TransactionKind::Borrowing, TransactionKind::Returning];

    /// Text stored in the `ltype` column.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Borrowing => "Borrowing",
            TransactionKind::Returning => "Returning",
        }
    }

    /// Change applied to the book's stock when this transaction is recorded.
    pub fn stock_delta(self) -> i64 {
        match self {
            TransactionKind::Borrowing => -1,
            TransactionKind::Returning => 1,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Borrowing" => Ok(TransactionKind::Borrowing),
            "Returning" => Ok(TransactionKind::Returning),
            other => Err(LedgerError::InvalidKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One row of the transaction history, joined with the book and client it
/// references. The joined columns are optional because the history query is a
/// left join.
pub struct LogEntry {
    /// Primary key (`lid`) from the database.
    pub id: i64,
    pub book_id: i64,
    pub client_id: i64,
    pub kind: TransactionKind,
    /// `DATETIME('now')` at insert time, UTC.
    pub timestamp: String,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Which entity type the catalog is currently mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Book,
    Client,
    Log,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Book, Mode::Client, Mode::Log];

    /// Ordered column layout for this mode.
    pub fn columns(self) -> &'static [Column] {
        match self {
            Mode::Book => BOOK_COLUMNS,
            Mode::Client => CLIENT_COLUMNS,
            Mode::Log => LOG_COLUMNS,
        }
    }

    /// Label used for the mode tab.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Book => "Books",
            Mode::Client => "Clients",
            Mode::Log => "Logs",
        }
    }
}

/// A displayable attribute of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Stock,
    FirstName,
    LastName,
    Kind,
    Timestamp,
}

impl Field {
    /// Column key as named in the schema.
    pub fn key(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Stock => "stock",
            Field::FirstName => "fname",
            Field::LastName => "lname",
            Field::Kind => "ltype",
            Field::Timestamp => "ldate",
        }
    }
}

/// Pairs a field with its header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub field: Field,
    pub label: &'static str,
}

const BOOK_COLUMNS: &[Column] = &[
    Column {
        field: Field::Title,
        label: "Title",
    },
    Column {
        field: Field::Stock,
        label: "Stock",
    },
];

const CLIENT_COLUMNS: &[Column] = &[
    Column {
        field: Field::FirstName,
        label: "First Name",
    },
    Column {
        field: Field::LastName,
        label: "Last Name",
    },
];

const LOG_COLUMNS: &[Column] = &[
    Column {
        field: Field::Title,
        label: "Title",
    },
    Column {
        field: Field::Kind,
        label: "Type",
    },
    Column {
        field: Field::FirstName,
        label: "First Name",
    },
    Column {
        field: Field::LastName,
        label: "Last Name",
    },
    Column {
        field: Field::Timestamp,
        label: "Date",
    },
];

/// A cached row. The variant always matches the catalog's mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Book(Book),
    Client(Client),
    Log(LogEntry),
}

impl Record {
    /// Entity id of the underlying row. Stable across fetches, unlike the row
    /// position.
    pub fn id(&self) -> i64 {
        match self {
            Record::Book(book) => book.id,
            Record::Client(client) => client.id,
            Record::Log(entry) => entry.id,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Record::Book(_) => Mode::Book,
            Record::Client(_) => Mode::Client,
            Record::Log(_) => Mode::Log,
        }
    }

    /// Render one cell. `None` when the record has no such field or the joined
    /// value is missing.
    pub fn field(&self, field: Field) -> Option<String> {
        match (self, field) {
            (Record::Book(book), Field::Title) => Some(book.title.clone()),
            (Record::Book(book), Field::Stock) => Some(book.stock.to_string()),
            (Record::Client(client), Field::FirstName) => Some(client.first_name.clone()),
            (Record::Client(client), Field::LastName) => Some(client.last_name.clone()),
            (Record::Log(entry), Field::Title) => entry.title.clone(),
            (Record::Log(entry), Field::Kind) => Some(entry.kind.to_string()),
            (Record::Log(entry), Field::FirstName) => entry.first_name.clone(),
            (Record::Log(entry), Field::LastName) => entry.last_name.clone(),
            (Record::Log(entry), Field::Timestamp) => Some(entry.timestamp.clone()),
            _ => None,
        }
    }

    /// Case-insensitive substring match over first name, last name and title.
    /// `needle` must already be lower-cased.
    pub fn matches(&self, needle: &str) -> bool {
        [Field::FirstName, Field::LastName, Field::Title]
            .into_iter()
            .filter_map(|field| self.field(field))
            .any(|value| value.to_lowercase().contains(needle))
    }

    /// Short human label used by confirmation prompts.
    pub fn describe(&self) -> String {
        match self {
            Record::Book(book) => book.title.clone(),
            Record::Client(client) => client.full_name(),
            Record::Log(entry) => format!(
                "{} ({}, {})",
                entry.title.as_deref().unwrap_or("?"),
                entry.kind,
                entry.timestamp
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(first: &str, last: &str) -> Record {
        Record::Client(Client {
            id: 1,
            first_name: first.to_string(),
            last_name: last.to_string(),
        })
    }

    #[test]
    fn columns_follow_mode_layout() {
        let labels: Vec<_> = Mode::Log.columns().iter().map(|c| c.label).collect();
        assert_eq!(labels, ["Title", "Type", "First Name", "Last Name", "Date"]);

        let keys: Vec<_> = Mode::Client.columns().iter().map(|c| c.field.key()).collect();
        assert_eq!(keys, ["fname", "lname"]);

        let keys: Vec<_> = Mode::Book.columns().iter().map(|c| c.field.key()).collect();
        assert_eq!(keys, ["title", "stock"]);
    }

    #[test]
    fn matches_any_name_field_ignoring_case() {
        let ann = client("Ann", "Lee");
        assert!(ann.matches("ann"));
        assert!(ann.matches("lee"));
        assert!(ann.matches("nn"));
        assert!(!ann.matches("bob"));
    }

    #[test]
    fn book_stock_is_not_searchable() {
        let book = Record::Book(Book {
            id: 3,
            title: "Dune".to_string(),
            stock: 42,
        });
        assert!(book.matches("dun"));
        assert!(!book.matches("42"));
    }

    #[test]
    fn log_entry_matches_on_joined_fields() {
        let entry = Record::Log(LogEntry {
            id: 9,
            book_id: 1,
            client_id: 2,
            kind: TransactionKind::Borrowing,
            timestamp: "2024-01-01 10:00:00".to_string(),
            title: Some("Dune".to_string()),
            first_name: None,
            last_name: Some("Lee".to_string()),
        });
        assert!(entry.matches("dune"));
        assert!(entry.matches("lee"));
        assert!(!entry.matches("borrow"));
        assert_eq!(entry.field(Field::FirstName), None);
    }

    #[test]
    fn kind_round_trips_through_column_text() {
        for kind in TransactionKind::ALL {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert!(matches!(
            "Lending".parse::<TransactionKind>(),
            Err(LedgerError::InvalidKind(_))
        ));
    }
}
