use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, Client, Mode, Record, TransactionKind};

/// Style shared by every form line: yellow while focused, grey when empty.
fn field_style(is_active: bool, is_empty: bool) -> Style {
    if is_active {
        Style::default().fg(Color::Yellow)
    } else if is_empty {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    }
}

fn text_line(field_name: &str, value: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        "<required>".to_string()
    } else {
        value.to_string()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, field_style(is_active, value.is_empty())),
    ])
}

/// Internal representation of the "book" form fields.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) stock: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Stock,
}

impl BookForm {
    /// Populate the form from an existing book when editing.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            stock: book.stock.to_string(),
            active: BookField::Title,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Stock,
            BookField::Stock => BookField::Title,
        };
    }

    /// Append a character to the active field. Stock only takes digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            BookField::Title if !ch.is_control() => {
                self.title.push(ch);
                true
            }
            BookField::Stock if ch.is_ascii_digit() => {
                self.stock.push(ch);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Stock => {
                self.stock.pop();
            }
        }
    }

    /// Check the required fields and parse the stock. A figure too large for
    /// the store is refused here rather than coerced.
    pub(crate) fn parse_inputs(&self) -> Result<(String, i64)> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Book title is required."));
        }
        let stock = self.stock.trim();
        if stock.is_empty() {
            return Err(anyhow!("Stock is required."));
        }
        let stock = stock
            .parse::<i64>()
            .map_err(|_| anyhow!("Stock must be a whole number up to {}.", i64::MAX))?;
        Ok((title.to_string(), stock))
    }

    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        let value = match field {
            BookField::Title => &self.title,
            BookField::Stock => &self.stock,
        };
        text_line(field_name, value, self.active == field)
    }

    pub(crate) fn value_len(&self, field: BookField) -> usize {
        match field {
            BookField::Title => self.title.chars().count(),
            BookField::Stock => self.stock.chars().count(),
        }
    }
}

/// Internal representation of the "client" form fields.
#[derive(Default, Clone)]
pub(crate) struct ClientForm {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) active: ClientField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum ClientField {
    #[default]
    FirstName,
    LastName,
}

impl ClientForm {
    pub(crate) fn from_client(client: &Client) -> Self {
        Self {
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            active: ClientField::FirstName,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            ClientField::FirstName => ClientField::LastName,
            ClientField::LastName => ClientField::FirstName,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            ClientField::FirstName => self.first_name.push(ch),
            ClientField::LastName => self.last_name.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            ClientField::FirstName => {
                self.first_name.pop();
            }
            ClientField::LastName => {
                self.last_name.pop();
            }
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<(String, String)> {
        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            return Err(anyhow!("First name is required."));
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            return Err(anyhow!("Last name is required."));
        }
        Ok((first_name.to_string(), last_name.to_string()))
    }

    pub(crate) fn build_line(&self, field_name: &str, field: ClientField) -> Line<'static> {
        let value = match field {
            ClientField::FirstName => &self.first_name,
            ClientField::LastName => &self.last_name,
        };
        text_line(field_name, value, self.active == field)
    }

    pub(crate) fn value_len(&self, field: ClientField) -> usize {
        match field {
            ClientField::FirstName => self.first_name.chars().count(),
            ClientField::LastName => self.last_name.chars().count(),
        }
    }
}

/// State of the "Record Transaction" dialog: three pickers over the books,
/// the clients and the two transaction kinds.
pub(crate) struct TransactionForm {
    pub(crate) books: Vec<Book>,
    pub(crate) clients: Vec<Client>,
    pub(crate) book: usize,
    pub(crate) client: usize,
    pub(crate) kind: usize,
    pub(crate) active: TransactionField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum TransactionField {
    Book,
    Client,
    Kind,
}

impl TransactionForm {
    /// Build the dialog, pre-selecting the given book and client when they are
    /// present. Fails when there is nothing to pick from.
    pub(crate) fn new(
        books: Vec<Book>,
        clients: Vec<Client>,
        book_id: Option<i64>,
        client_id: Option<i64>,
    ) -> Result<Self> {
        if books.is_empty() || clients.is_empty() {
            return Err(anyhow!(
                "To record a transaction you must have at least one book and one client in the database."
            ));
        }

        let book = book_id
            .and_then(|id| books.iter().position(|book| book.id == id))
            .unwrap_or(0);
        let client = client_id
            .and_then(|id| clients.iter().position(|client| client.id == id))
            .unwrap_or(0);

        Ok(Self {
            books,
            clients,
            book,
            client,
            kind: 0,
            active: TransactionField::Book,
            error: None,
        })
    }

    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            TransactionField::Book => TransactionField::Client,
            TransactionField::Client => TransactionField::Kind,
            TransactionField::Kind => TransactionField::Book,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            TransactionField::Book => TransactionField::Kind,
            TransactionField::Client => TransactionField::Book,
            TransactionField::Kind => TransactionField::Client,
        };
    }

    /// Move the active picker by `offset`, wrapping at both ends.
    pub(crate) fn cycle(&mut self, offset: isize) {
        let (index, len) = match self.active {
            TransactionField::Book => (&mut self.book, self.books.len()),
            TransactionField::Client => (&mut self.client, self.clients.len()),
            TransactionField::Kind => (&mut self.kind, TransactionKind::ALL.len()),
        };
        if len == 0 {
            return;
        }
        let len = len as isize;
        *index = ((*index as isize + offset).rem_euclid(len)) as usize;
        self.error = None;
    }

    pub(crate) fn selected_book(&self) -> &Book {
        &self.books[self.book]
    }

    pub(crate) fn selected_client(&self) -> &Client {
        &self.clients[self.client]
    }

    pub(crate) fn selected_kind(&self) -> TransactionKind {
        TransactionKind::ALL[self.kind]
    }

    pub(crate) fn build_line(&self, field_name: &str, field: TransactionField) -> Line<'static> {
        let value = match field {
            TransactionField::Book => {
                let book = self.selected_book();
                format!("{} ({} in stock)", book.title, book.stock)
            }
            TransactionField::Client => self.selected_client().full_name(),
            TransactionField::Kind => self.selected_kind().to_string(),
        };
        let is_active = self.active == field;
        let arrows = if is_active { "◀ " } else { "  " };
        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(format!("{arrows}{value}"), field_style(is_active, false)),
            Span::styled(if is_active { " ▶" } else { "" }, field_style(is_active, false)),
        ])
    }
}

/// Pending destructive action awaiting a yes/no answer.
#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) mode: Mode,
    pub(crate) id: i64,
    pub(crate) label: String,
}

impl ConfirmDelete {
    pub(crate) fn from(record: &Record) -> Self {
        Self {
            mode: record.mode(),
            id: record.id(),
            label: record.describe(),
        }
    }

    /// Follow-up line warning about the history rows that go with the record.
    pub(crate) fn consequence(&self) -> &'static str {
        match self.mode {
            Mode::Book => "Every transaction for this book is removed too.",
            Mode::Client => "Every transaction for this client is removed too.",
            Mode::Log => "The book's stock is not adjusted back.",
        }
    }
}
