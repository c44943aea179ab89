use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::error::LedgerError;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Split catalog errors into ones the user can act on and store failures,
/// which are passed back up to end the session.
pub(crate) fn recoverable(err: LedgerError) -> anyhow::Result<String> {
    match err {
        LedgerError::OutOfStock { .. } => Ok("This book is out of stock!".to_string()),
        LedgerError::Store(_) => Err(err.into()),
        other => Ok(capitalize(&other.to_string())),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>() + ".",
        None => String::new(),
    }
}

/// A `[key] label` pair for the footer.
pub(crate) fn key_hint(key: &str, label: &str) -> [Span<'static>; 2] {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    [
        Span::styled(format!("[{key}]"), key_style),
        Span::raw(format!(" {label}   ")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_stock_gets_the_warning_text() {
        let message = recoverable(LedgerError::OutOfStock {
            book_id: 1,
            title: "Dune".to_string(),
        })
        .unwrap();
        assert_eq!(message, "This book is out of stock!");
    }

    #[test]
    fn not_found_is_shown_to_the_user() {
        let message = recoverable(LedgerError::NotFound {
            entity: "book",
            id: 4,
        })
        .unwrap();
        assert_eq!(message, "Book 4 not found.");
    }

    #[test]
    fn stock_overflow_is_shown_to_the_user() {
        let message = recoverable(LedgerError::StockOverflow {
            book_id: 1,
            title: "Dune".to_string(),
        })
        .unwrap();
        assert_eq!(message, "Stock of \"Dune\" cannot go any higher.");
    }

    #[test]
    fn store_failures_are_not_recoverable() {
        let err = LedgerError::Store(rusqlite::Error::QueryReturnedNoRows);
        assert!(recoverable(err).is_err());
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
    }
}
