//! Core library surface for the Library Ledger TUI application.
//!
//! The catalog and persistence layers are usable without the terminal front
//! end, which is what the integration tests do.
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ui;

/// The record cache and its change notifications.
pub use catalog::{coerce_stock, Catalog, ContentsChanged};

pub use config::Config;

pub use error::LedgerError;

/// Domain types shared by every layer.
pub use models::{Book, Client, Column, Field, LogEntry, Mode, Record, TransactionKind};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
