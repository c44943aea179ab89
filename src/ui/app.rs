use std::mem;
use std::sync::mpsc::Receiver;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use ratatui::Frame;

use crate::catalog::{Catalog, ContentsChanged};
use crate::db;
use crate::models::{Mode, Record};

use super::forms::{
    BookField, BookForm, ClientField, ClientForm, ConfirmDelete, TransactionField,
    TransactionForm,
};
use super::helpers::{centered_rect, key_hint, recoverable, surface_error};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp / PageDown.
const PAGE_STEP: isize = 10;

/// Modal state layered over the list. Only one is active at a time and it
/// decides what keystrokes do.
enum Overlay {
    None,
    AddingBook(BookForm),
    EditingBook { id: i64, form: BookForm },
    AddingClient(ClientForm),
    EditingClient { id: i64, form: ClientForm },
    RecordingTransaction(TransactionForm),
    ConfirmDelete(ConfirmDelete),
    Searching,
    About,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    catalog: Catalog,
    events: Receiver<ContentsChanged>,
    selected: usize,
    /// Text typed into the search bar; non-empty while a filter is applied.
    query: String,
    overlay: Overlay,
    status: Option<StatusMessage>,
}

impl App {
    /// Take ownership of the catalog and load the book list.
    pub fn new(mut catalog: Catalog) -> Result<Self> {
        let events = catalog.subscribe();
        let mut app = Self {
            catalog,
            events,
            selected: 0,
            query: String::new(),
            overlay: Overlay::None,
            status: None,
        };
        app.switch_mode(Mode::Book)?;
        Ok(app)
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let overlay = mem::replace(&mut self.overlay, Overlay::None);

        self.overlay = match overlay {
            Overlay::None => self.handle_normal_key(code, &mut exit)?,
            Overlay::AddingBook(form) => self.handle_book_form(code, None, form)?,
            Overlay::EditingBook { id, form } => self.handle_book_form(code, Some(id), form)?,
            Overlay::AddingClient(form) => self.handle_client_form(code, None, form)?,
            Overlay::EditingClient { id, form } => {
                self.handle_client_form(code, Some(id), form)?
            }
            Overlay::RecordingTransaction(form) => self.handle_transaction(code, form)?,
            Overlay::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Overlay::Searching => self.handle_search(code)?,
            Overlay::About => Overlay::None,
        };

        self.sync_selection();
        Ok(exit)
    }

    /// Ctrl+R: reload the active list from the store.
    pub(crate) fn handle_ctrl_r(&mut self) -> Result<()> {
        if matches!(self.overlay, Overlay::None | Overlay::Searching) {
            self.overlay = Overlay::None;
            self.switch_mode(self.catalog.mode())?;
        }
        Ok(())
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Overlay> {
        let mode = self.catalog.mode();
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.catalog.is_filtering() {
                    self.clear_search();
                }
            }
            KeyCode::Char('1') => self.switch_mode(Mode::Book)?,
            KeyCode::Char('2') => self.switch_mode(Mode::Client)?,
            KeyCode::Char('3') => self.switch_mode(Mode::Log)?,
            KeyCode::Tab => self.switch_mode(next_mode(mode, 1))?,
            KeyCode::BackTab => self.switch_mode(next_mode(mode, -1))?,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.catalog.len().saturating_sub(1),
            KeyCode::Char('r') | KeyCode::Char('R') => self.switch_mode(mode)?,
            KeyCode::Char('?') | KeyCode::F(1) => return Ok(Overlay::About),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                return Ok(Overlay::Searching);
            }
            KeyCode::Char('b') => {
                self.clear_status();
                if mode != Mode::Book {
                    self.switch_mode(Mode::Book)?;
                }
                return Ok(Overlay::AddingBook(BookForm::default()));
            }
            KeyCode::Char('c') => {
                self.clear_status();
                if mode != Mode::Client {
                    self.switch_mode(Mode::Client)?;
                }
                return Ok(Overlay::AddingClient(ClientForm::default()));
            }
            KeyCode::Char('t') | KeyCode::Char('T') => return self.open_transaction_dialog(),
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                return Ok(self.open_edit_form());
            }
            KeyCode::Char('B') if mode == Mode::Log => return self.edit_from_log(Mode::Book),
            KeyCode::Char('C') if mode == Mode::Log => return self.edit_from_log(Mode::Client),
            KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(record) = self.current_record() {
                    let confirm = ConfirmDelete::from(record);
                    self.clear_status();
                    return Ok(Overlay::ConfirmDelete(confirm));
                }
                self.set_status("Nothing selected to delete.", StatusKind::Error);
            }
            _ => {}
        }
        Ok(Overlay::None)
    }

    fn handle_book_form(
        &mut self,
        code: KeyCode,
        id: Option<i64>,
        mut form: BookForm,
    ) -> Result<Overlay> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok((title, stock)) => match self.save_book(id, &title, stock)? {
                    None => keep_open = false,
                    Some(message) => {
                        self.set_status(message.clone(), StatusKind::Error);
                        form.error = Some(message);
                    }
                },
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        Ok(match (keep_open, id) {
            (false, _) => Overlay::None,
            (true, None) => Overlay::AddingBook(form),
            (true, Some(id)) => Overlay::EditingBook { id, form },
        })
    }

    fn handle_client_form(
        &mut self,
        code: KeyCode,
        id: Option<i64>,
        mut form: ClientForm,
    ) -> Result<Overlay> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok((first_name, last_name)) => {
                    match self.save_client(id, &first_name, &last_name)? {
                        None => keep_open = false,
                        Some(message) => {
                            self.set_status(message.clone(), StatusKind::Error);
                            form.error = Some(message);
                        }
                    }
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        Ok(match (keep_open, id) {
            (false, _) => Overlay::None,
            (true, None) => Overlay::AddingClient(form),
            (true, Some(id)) => Overlay::EditingClient { id, form },
        })
    }

    fn handle_transaction(&mut self, code: KeyCode, mut form: TransactionForm) -> Result<Overlay> {
        match code {
            KeyCode::Esc => {
                self.set_status("Transaction cancelled.", StatusKind::Info);
                return Ok(Overlay::None);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left => form.cycle(-1),
            KeyCode::Right | KeyCode::Char(' ') => form.cycle(1),
            KeyCode::Enter => {
                let book = form.selected_book().clone();
                let client = form.selected_client().clone();
                let kind = form.selected_kind();
                match self.catalog.record_transaction(book.id, client.id, kind) {
                    Ok(_) => {
                        self.switch_mode(Mode::Log)?;
                        self.set_status(
                            format!(
                                "Recorded {kind} of \"{}\" for {}.",
                                book.title,
                                client.full_name()
                            ),
                            StatusKind::Info,
                        );
                        return Ok(Overlay::None);
                    }
                    Err(err) => {
                        let message = recoverable(err)?;
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            _ => {}
        }
        Ok(Overlay::RecordingTransaction(form))
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Overlay> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Overlay::None)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let outcome = match confirm.mode {
                    Mode::Book => self.catalog.delete_book(confirm.id),
                    Mode::Client => self.catalog.delete_client(confirm.id),
                    Mode::Log => self.catalog.delete_transaction(confirm.id),
                };
                match outcome {
                    Ok(()) => self.set_status(
                        format!("Deleted \"{}\" from the database.", confirm.label),
                        StatusKind::Info,
                    ),
                    Err(err) => {
                        let message = recoverable(err)?;
                        self.set_status(message, StatusKind::Error);
                    }
                }
                Ok(Overlay::None)
            }
            _ => Ok(Overlay::ConfirmDelete(confirm)),
        }
    }

    fn handle_search(&mut self, code: KeyCode) -> Result<Overlay> {
        match code {
            KeyCode::Esc => {
                self.clear_search();
                return Ok(Overlay::None);
            }
            KeyCode::Enter => {
                if self.query.is_empty() {
                    self.set_status("Search finished...", StatusKind::Info);
                } else {
                    self.set_status(
                        format!("Showing results for \"{}\"", self.query),
                        StatusKind::Info,
                    );
                }
                return Ok(Overlay::None);
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Backspace => {
                self.query.pop();
                self.apply_search();
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.query.push(ch);
                self.apply_search();
            }
            _ => {}
        }
        Ok(Overlay::Searching)
    }

    /// Returns a message to show in the form, or `None` when the book was
    /// saved. Store failures come back as `Err`.
    fn save_book(&mut self, id: Option<i64>, title: &str, stock: i64) -> Result<Option<String>> {
        let saved = match id {
            None => match self.catalog.add_book(title, stock) {
                Ok(book) => book.map(|book| book.id),
                Err(err) => return recoverable(err).map(Some),
            },
            Some(id) => match self.catalog.edit_book(id, title, stock) {
                Ok(true) => Some(id),
                Ok(false) => None,
                Err(err) => return recoverable(err).map(Some),
            },
        };

        let Some(book_id) = saved else {
            return Ok(Some(if id.is_some() {
                "Stock cannot be negative.".to_string()
            } else {
                "Stock must be at least 1.".to_string()
            }));
        };

        self.focus(Mode::Book, book_id);
        let verb = if id.is_some() { "Updated" } else { "Added" };
        self.set_status(format!("{verb} \"{title}\"."), StatusKind::Info);
        Ok(None)
    }

    fn save_client(
        &mut self,
        id: Option<i64>,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<String>> {
        let saved = match id {
            None => match self.catalog.add_client(first_name, last_name) {
                Ok(client) => client.map(|client| client.id),
                Err(err) => return recoverable(err).map(Some),
            },
            Some(id) => match self.catalog.edit_client(id, first_name, last_name) {
                Ok(true) => Some(id),
                Ok(false) => None,
                Err(err) => return recoverable(err).map(Some),
            },
        };

        let Some(client_id) = saved else {
            return Ok(Some("First and last name are required.".to_string()));
        };

        self.focus(Mode::Client, client_id);
        let verb = if id.is_some() { "Updated" } else { "Added" };
        self.set_status(
            format!("{verb} \"{first_name} {last_name}\"."),
            StatusKind::Info,
        );
        Ok(None)
    }

    fn open_edit_form(&mut self) -> Overlay {
        match self.current_record() {
            Some(Record::Book(book)) => Overlay::EditingBook {
                id: book.id,
                form: BookForm::from_book(book),
            },
            Some(Record::Client(client)) => Overlay::EditingClient {
                id: client.id,
                form: ClientForm::from_client(client),
            },
            Some(Record::Log(_)) => {
                self.set_status(
                    "Use B or C to edit the book or client of this entry.",
                    StatusKind::Info,
                );
                Overlay::None
            }
            None => {
                self.set_status("Nothing selected to edit.", StatusKind::Error);
                Overlay::None
            }
        }
    }

    /// Edit the book or client referenced by the highlighted history row.
    fn edit_from_log(&mut self, target: Mode) -> Result<Overlay> {
        let Some(Record::Log(entry)) = self.current_record() else {
            self.set_status("Nothing selected to edit.", StatusKind::Error);
            return Ok(Overlay::None);
        };
        let (book_id, client_id) = (entry.book_id, entry.client_id);

        let overlay = match target {
            Mode::Book => db::fetch_book(self.catalog.connection(), book_id)?.map(|book| {
                Overlay::EditingBook {
                    id: book.id,
                    form: BookForm::from_book(&book),
                }
            }),
            Mode::Client => {
                db::fetch_client(self.catalog.connection(), client_id)?.map(|client| {
                    Overlay::EditingClient {
                        id: client.id,
                        form: ClientForm::from_client(&client),
                    }
                })
            }
            Mode::Log => None,
        };

        Ok(overlay.unwrap_or_else(|| {
            self.set_status("That record no longer exists.", StatusKind::Error);
            Overlay::None
        }))
    }

    /// Open the transaction dialog with the highlighted book or client
    /// pre-selected.
    fn open_transaction_dialog(&mut self) -> Result<Overlay> {
        let (book_id, client_id) = match self.current_record() {
            Some(Record::Book(book)) => (Some(book.id), None),
            Some(Record::Client(client)) => (None, Some(client.id)),
            Some(Record::Log(entry)) => (Some(entry.book_id), Some(entry.client_id)),
            None => (None, None),
        };

        let books = db::fetch_books(self.catalog.connection())?;
        let clients = db::fetch_clients(self.catalog.connection())?;
        match TransactionForm::new(books, clients, book_id, client_id) {
            Ok(form) => {
                self.clear_status();
                Ok(Overlay::RecordingTransaction(form))
            }
            Err(err) => {
                self.set_status(surface_error(&err), StatusKind::Error);
                Ok(Overlay::None)
            }
        }
    }

    /// Switch the list to `mode`, dropping any search, and report how many rows
    /// were loaded.
    fn switch_mode(&mut self, mode: Mode) -> Result<()> {
        self.query.clear();
        self.catalog.switch_mode(mode)?;
        self.selected = 0;
        if let Some(event) = self.events.try_iter().last() {
            self.set_status(
                format!("Loaded {} item(s)...", event.count),
                StatusKind::Info,
            );
        }
        Ok(())
    }

    fn apply_search(&mut self) {
        self.catalog.search(&self.query);
        self.selected = 0;
    }

    fn clear_search(&mut self) {
        self.query.clear();
        self.catalog.search("");
        self.set_status("Search finished...", StatusKind::Info);
    }

    /// Drain change notifications and keep the cursor inside the list.
    fn sync_selection(&mut self) {
        let count = self
            .events
            .try_iter()
            .last()
            .map_or(self.catalog.len(), |event| event.count);
        if count == 0 {
            self.selected = 0;
        } else if self.selected >= count {
            self.selected = count - 1;
        }
    }

    /// Move the cursor onto the record with `id` if the list shows `mode`.
    fn focus(&mut self, mode: Mode, id: i64) {
        if self.catalog.mode() != mode {
            return;
        }
        if let Some(row) = self.catalog.position_of(id) {
            self.selected = row;
        }
    }

    fn move_selection(&mut self, offset: isize) {
        let len = self.catalog.len();
        if len == 0 {
            return;
        }
        let new = (self.selected as isize + offset).clamp(0, len as isize - 1);
        self.selected = new as usize;
    }

    fn current_record(&self) -> Option<&Record> {
        self.catalog.record(self.selected)
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);
        let search_height = if matches!(self.overlay, Overlay::Searching) || !self.query.is_empty()
        {
            3
        } else {
            0
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(search_height),
                Constraint::Min(0),
                Constraint::Length(footer_height),
            ])
            .split(area);

        self.draw_tabs(frame, chunks[0]);
        if search_height > 0 {
            self.draw_search_bar(frame, chunks[1]);
        }
        self.draw_table(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);

        match &self.overlay {
            Overlay::AddingBook(form) => self.draw_book_form(frame, area, "Add Book", form),
            Overlay::EditingBook { form, .. } => {
                self.draw_book_form(frame, area, "Edit Book", form)
            }
            Overlay::AddingClient(form) => self.draw_client_form(frame, area, "Add Client", form),
            Overlay::EditingClient { form, .. } => {
                self.draw_client_form(frame, area, "Edit Client", form)
            }
            Overlay::RecordingTransaction(form) => self.draw_transaction(frame, area, form),
            Overlay::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Overlay::About => self.draw_about(frame, area),
            Overlay::Searching | Overlay::None => {}
        }
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let selected = Mode::ALL
            .iter()
            .position(|mode| *mode == self.catalog.mode())
            .unwrap_or(0);
        let titles = Mode::ALL
            .iter()
            .enumerate()
            .map(|(idx, mode)| format!("{} {}", idx + 1, mode.label()));
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Library Ledger"),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect) {
        let editing = matches!(self.overlay, Overlay::Searching);
        let title = if editing { "Search" } else { "Filter (Esc clears)" };
        let block = Block::default().borders(Borders::ALL).title(title);
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", self.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);

        if editing {
            let inner = block.inner(area);
            let cursor_x = inner.x + "Search: ".len() as u16 + self.query.chars().count() as u16;
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        if area.height == 0 {
            return;
        }
        let mode = self.catalog.mode();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} ({})", mode.label(), self.catalog.len()));

        if self.catalog.is_empty() {
            let text = if self.catalog.is_filtering() {
                "No entries match the current search."
            } else {
                match mode {
                    Mode::Book => "No books yet. Press 'b' to add one.",
                    Mode::Client => "No clients yet. Press 'c' to add one.",
                    Mode::Log => "No transactions yet. Press 't' to record one.",
                }
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let columns = self.catalog.columns();
        let header = Row::new(columns.iter().map(|column| Cell::from(column.label)))
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = self.catalog.items().iter().map(|record| {
            Row::new(
                columns
                    .iter()
                    .map(|column| Cell::from(record.field(column.field).unwrap_or_default())),
            )
        });
        let share = (100 / columns.len().max(1)) as u16;
        let widths = vec![Constraint::Percentage(share); columns.len()];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut state = TableState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let hints: &[(&str, &str)] = match &self.overlay {
            Overlay::Searching => &[("Type", "Filter"), ("Enter", "Keep"), ("Esc", "Clear")],
            Overlay::ConfirmDelete(_) => &[("Y", "Delete"), ("N/Esc", "Cancel")],
            Overlay::RecordingTransaction(_) => &[
                ("↑↓", "Field"),
                ("←→", "Choose"),
                ("Enter", "Record"),
                ("Esc", "Cancel"),
            ],
            Overlay::About => &[("Any key", "Close")],
            Overlay::None => match self.catalog.mode() {
                Mode::Log => &[
                    ("1-3", "View"),
                    ("f", "Search"),
                    ("t", "Transaction"),
                    ("B/C", "Edit book/client"),
                    ("-", "Delete"),
                    ("r", "Refresh"),
                    ("q", "Quit"),
                ],
                _ => &[
                    ("1-3", "View"),
                    ("f", "Search"),
                    ("b", "Add book"),
                    ("c", "Add client"),
                    ("t", "Transaction"),
                    ("e", "Edit"),
                    ("-", "Delete"),
                    ("q", "Quit"),
                ],
            },
            _ => &[("Tab", "Switch field"), ("Enter", "Save"), ("Esc", "Cancel")],
        };

        Line::from(
            hints
                .iter()
                .flat_map(|(key, label)| key_hint(key, label))
                .collect::<Vec<_>>(),
        )
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Title", BookField::Title),
            form.build_line("Stock", BookField::Stock),
            Line::from(""),
        ];
        lines.push(form_hint(form.error.as_deref()));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (prefix, offset) = match form.active {
            BookField::Title => ("Title: ", 0),
            BookField::Stock => ("Stock: ", 1),
        };
        let cursor_x = inner.x + prefix.len() as u16 + form.value_len(form.active) as u16;
        frame.set_cursor_position((cursor_x, inner.y + offset));
    }

    fn draw_client_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &ClientForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("First Name", ClientField::FirstName),
            form.build_line("Last Name", ClientField::LastName),
            Line::from(""),
        ];
        lines.push(form_hint(form.error.as_deref()));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        let (prefix, offset) = match form.active {
            ClientField::FirstName => ("First Name: ", 0),
            ClientField::LastName => ("Last Name: ", 1),
        };
        let cursor_x = inner.x + prefix.len() as u16 + form.value_len(form.active) as u16;
        frame.set_cursor_position((cursor_x, inner.y + offset));
    }

    fn draw_transaction(&self, frame: &mut Frame, area: Rect, form: &TransactionForm) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Record Transaction")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            form.build_line("Book", TransactionField::Book),
            form.build_line("Client", TransactionField::Client),
            form.build_line("Transaction Type", TransactionField::Kind),
            Line::from(""),
            match &form.error {
                Some(error) => Line::from(Span::styled(
                    error.clone(),
                    Style::default().fg(Color::Red),
                )),
                None => Line::from(Span::styled(
                    "Enter to record • ←→ to choose • Esc to cancel",
                    Style::default().fg(Color::Gray),
                )),
            },
        ];

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Are you sure?").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Deleting \"{}\" is irreversible!", confirm.label)),
            Line::from(confirm.consequence()),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_about(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from(Span::styled(
                "Library Ledger",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("version {}", env!("CARGO_PKG_VERSION"))),
            Line::from(""),
            Line::from("Books, clients and borrowing history in one SQLite file."),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().title("About").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }
}

fn form_hint(error: Option<&str>) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            "Enter to save • Tab to switch • Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    }
}

fn next_mode(mode: Mode, offset: isize) -> Mode {
    let len = Mode::ALL.len() as isize;
    let current = Mode::ALL.iter().position(|m| *m == mode).unwrap_or(0) as isize;
    Mode::ALL[(current + offset).rem_euclid(len) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::TransactionKind;

    fn app() -> App {
        App::new(Catalog::new(open_in_memory().unwrap())).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    #[test]
    fn tab_cycles_through_modes() {
        assert_eq!(next_mode(Mode::Book, 1), Mode::Client);
        assert_eq!(next_mode(Mode::Log, 1), Mode::Book);
        assert_eq!(next_mode(Mode::Book, -1), Mode::Log);
    }

    #[test]
    fn adding_a_book_through_the_form() {
        let mut app = app();
        app.handle_key(KeyCode::Char('b')).unwrap();
        type_text(&mut app, "Dune");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "2");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(app.overlay, Overlay::None));
        assert_eq!(app.catalog.len(), 1);
        assert_eq!(app.current_record().map(Record::describe).as_deref(), Some("Dune"));
    }

    #[test]
    fn zero_stock_keeps_the_form_open() {
        let mut app = app();
        app.handle_key(KeyCode::Char('b')).unwrap();
        type_text(&mut app, "Dune");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "0");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.overlay {
            Overlay::AddingBook(form) => {
                assert_eq!(form.error.as_deref(), Some("Stock must be at least 1."))
            }
            _ => panic!("form should stay open"),
        }
        assert!(app.catalog.is_empty());
    }

    #[test]
    fn oversized_stock_edit_leaves_the_book_alone() {
        let mut app = app();
        app.catalog.add_book("Dune", 5).unwrap();

        app.handle_key(KeyCode::Char('e')).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Backspace).unwrap();
        type_text(&mut app, "99999999999999999999");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(matches!(
            &app.overlay,
            Overlay::EditingBook { form, .. } if form.error.is_some()
        ));
        let book = db::fetch_books(app.catalog.connection()).unwrap().remove(0);
        assert_eq!(book.stock, 5);
    }

    #[test]
    fn search_bar_filters_and_escape_restores() {
        let mut app = app();
        app.catalog.add_book("Dune", 1).unwrap();
        app.catalog.add_book("Emma", 1).unwrap();

        app.handle_key(KeyCode::Char('f')).unwrap();
        type_text(&mut app, "em");
        assert_eq!(app.catalog.len(), 1);

        app.handle_key(KeyCode::Esc).unwrap();
        assert_eq!(app.catalog.len(), 2);
        assert!(!app.catalog.is_filtering());
    }

    #[test]
    fn out_of_stock_is_reported_in_the_dialog() {
        let mut app = app();
        app.catalog.add_book("Dune", 1).unwrap();
        app.catalog.add_client("Ann", "Lee").unwrap();
        let (book_id, client_id) = (1, 1);
        app.catalog
            .record_transaction(book_id, client_id, TransactionKind::Borrowing)
            .unwrap();

        app.handle_key(KeyCode::Char('t')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();
        match &app.overlay {
            Overlay::RecordingTransaction(form) => {
                assert_eq!(form.error.as_deref(), Some("This book is out of stock!"))
            }
            _ => panic!("dialog should stay open"),
        }
    }

    #[test]
    fn confirmed_delete_removes_the_row() {
        let mut app = app();
        app.catalog.add_book("Dune", 1).unwrap();

        app.handle_key(KeyCode::Char('-')).unwrap();
        assert!(matches!(app.overlay, Overlay::ConfirmDelete(_)));
        app.handle_key(KeyCode::Char('y')).unwrap();
        assert!(app.catalog.is_empty());
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn transaction_dialog_refuses_an_empty_library() {
        let mut app = app();
        app.handle_key(KeyCode::Char('t')).unwrap();
        assert!(matches!(app.overlay, Overlay::None));
        assert!(matches!(
            app.status.as_ref().map(|s| &s.kind),
            Some(StatusKind::Error)
        ));
    }
}
