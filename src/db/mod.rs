//! Persistence module split across logical submodules, one per table.

mod books;
mod clients;
mod connection;
mod logs;

pub use books::{create_book, delete_book, fetch_book, fetch_books, update_book};
pub use clients::{create_client, delete_client, fetch_client, fetch_clients, update_client};
pub use connection::{ensure_schema, open, open_in_memory};
pub use logs::{count_logs, delete_log, fetch_log, fetch_logs, record_transaction};
