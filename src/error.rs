//! Typed errors raised by the catalog. Invalid input is not an error here: it
//! is logged and skipped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A borrowing was attempted on a book with no copies left.
    #[error("\"{title}\" is out of stock")]
    OutOfStock { book_id: i64, title: String },

    /// A return would push the stock past what an `i64` can hold.
    #[error("stock of \"{title}\" cannot go any higher")]
    StockOverflow { book_id: i64, title: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("unknown transaction type {0:?}")]
    InvalidKind(String),

    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
