//! Ratatui front-end: one tabbed list over the catalog plus modal forms for
//! adding, editing, deleting and recording transactions.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
