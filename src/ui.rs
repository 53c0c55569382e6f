use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

use meal_journal::app::{needs_catalog_entry, suggestions, Status};
use meal_journal::db::TIMESTAMP_FORMAT;
use meal_journal::journal::now;
use meal_journal::notifications::FEED_SIZE;
use meal_journal::{
    handle, reseed, CatalogEntry, Command, Config, Journal, LogEntry, MatchResult,
    NotificationEntry, NotificationKind, SeedOptions, UiState, UsdaFoodSearch,
};

/// Log entries shown on the history page
const HISTORY_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    LogMeal,
    Catalog,
    History,
    Notifications,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::LogMeal => Page::Catalog,
            Page::Catalog => Page::History,
            Page::History => Page::Notifications,
            Page::Notifications => Page::LogMeal,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::LogMeal => Page::Notifications,
            Page::Catalog => Page::LogMeal,
            Page::History => Page::Catalog,
            Page::Notifications => Page::History,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::LogMeal => "Log Meal",
            Page::Catalog => "Meal Database",
            Page::History => "Recent Logs",
            Page::Notifications => "Notifications",
        }
    }
}

/// Focused input on the log page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Meal,
    Quantity,
    Category,
}

pub struct App<'a> {
    journal: &'a Journal,
    config: &'a Config,
    pub state: UiState,
    pub current_page: Page,
    pub focus: Field,
    pub quantity_input: String,
    /// Highlighted suggestion, if any
    pub suggestion: Option<usize>,
    pub catalog: Vec<CatalogEntry>,
    pub logs: Vec<LogEntry>,
    pub notifications: Vec<NotificationEntry>,
    pub catalog_state: TableState,
}

impl<'a> App<'a> {
    pub fn new(journal: &'a Journal, config: &'a Config) -> Result<Self> {
        let mut app = Self {
            journal,
            config,
            state: UiState::default(),
            current_page: Page::LogMeal,
            focus: Field::Meal,
            quantity_input: String::new(),
            suggestion: None,
            catalog: Vec::new(),
            logs: Vec::new(),
            notifications: Vec::new(),
            catalog_state: TableState::default(),
        };
        app.refresh()?;
        Ok(app)
    }

    /// Reload all three tables
    pub fn refresh(&mut self) -> Result<()> {
        self.catalog = self.journal.catalog_entries()?;
        self.logs = self.journal.recent_logs(HISTORY_SIZE)?;
        self.notifications = self.journal.notification_history()?;

        match self.catalog_state.selected() {
            _ if self.catalog.is_empty() => self.catalog_state.select(None),
            Some(i) if i >= self.catalog.len() => {
                self.catalog_state.select(Some(self.catalog.len() - 1))
            }
            None => self.catalog_state.select(Some(0)),
            _ => {}
        }
        Ok(())
    }

    /// Run a command through the handlers and apply its effects
    pub fn dispatch(&mut self, command: Command) {
        let outcome = handle(&self.state, &self.catalog, command, now());
        self.state = outcome.state;

        if let Err(e) = self.journal.apply(&outcome.effects) {
            self.state.status = Some(Status {
                kind: NotificationKind::Error,
                message: e.to_string(),
            });
        }
        if let Err(e) = self.refresh() {
            self.state.status = Some(Status {
                kind: NotificationKind::Error,
                message: e.to_string(),
            });
        }
    }

    pub fn suggestions(&self) -> Vec<MatchResult> {
        suggestions(&self.state, &self.catalog)
    }

    pub fn selected_catalog_entry(&self) -> Option<&CatalogEntry> {
        self.catalog_state.selected().and_then(|i| self.catalog.get(i))
    }

    fn reseed(&mut self) {
        let result = UsdaFoodSearch::new(self.config).map_err(|e| e.to_string()).and_then(|search| {
            reseed(self.journal, &search, SeedOptions::from_config(self.config))
                .map_err(|e| e.to_string())
        });
        self.state.status = Some(match result {
            Ok(_) => Status {
                kind: NotificationKind::Success,
                message: "Database reinitialized".to_string(),
            },
            Err(e) => Status {
                kind: NotificationKind::Error,
                message: e,
            },
        });
        if let Err(e) = self.refresh() {
            self.state.status = Some(Status {
                kind: NotificationKind::Error,
                message: e.to_string(),
            });
        }
    }

    /// Handle one key press. Returns true when the app should quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if self.state.popup_open() {
            self.on_popup_key(key);
            return false;
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.current_page = self.current_page.next();
                return false;
            }
            KeyCode::BackTab => {
                self.current_page = self.current_page.previous();
                return false;
            }
            _ => {}
        }

        match self.current_page {
            Page::LogMeal => self.on_log_key(key),
            Page::Catalog => return self.on_catalog_key(key),
            Page::History => return key.code == KeyCode::Char('q'),
            Page::Notifications => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('a') => self.dispatch(Command::ToggleNotifications),
                _ => {}
            },
        }

        false
    }

    fn on_log_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => self.dispatch(Command::SaveMeal),
                KeyCode::Char('a') => self.dispatch(Command::OpenAddPopup),
                _ => {}
            }
            return;
        }

        match self.focus {
            Field::Meal => self.on_meal_key(key),
            Field::Quantity => match key.code {
                KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                    self.quantity_input.push(c);
                    self.sync_quantity();
                }
                KeyCode::Backspace => {
                    self.quantity_input.pop();
                    self.sync_quantity();
                }
                KeyCode::Up => self.focus = Field::Meal,
                KeyCode::Enter | KeyCode::Down => self.focus = Field::Category,
                _ => {}
            },
            Field::Category => match key.code {
                KeyCode::Left => self.dispatch(Command::SetCategory(self.state.category.previous())),
                KeyCode::Right => self.dispatch(Command::SetCategory(self.state.category.next())),
                KeyCode::Up => self.focus = Field::Quantity,
                KeyCode::Enter => {
                    self.dispatch(Command::SaveMeal);
                    if !self.state_rejected() {
                        self.focus = Field::Meal;
                    }
                }
                _ => {}
            },
        }
    }

    fn on_meal_key(&mut self, key: KeyEvent) {
        let count = self.suggestions().len();

        match key.code {
            KeyCode::Char(c) => {
                let mut text = self.state.meal_input.clone();
                text.push(c);
                self.dispatch(Command::SetMealInput(text));
                self.suggestion = None;
            }
            KeyCode::Backspace => {
                let mut text = self.state.meal_input.clone();
                text.pop();
                self.dispatch(Command::SetMealInput(text));
                self.suggestion = None;
            }
            KeyCode::Down if count > 0 => {
                self.suggestion = Some(match self.suggestion {
                    Some(i) if i + 1 < count => i + 1,
                    Some(i) => i,
                    None => 0,
                });
            }
            KeyCode::Up => {
                self.suggestion = match self.suggestion {
                    Some(0) | None => None,
                    Some(i) => Some(i - 1),
                };
            }
            KeyCode::Enter => match self.suggestion.and_then(|i| self.suggestions().get(i).cloned()) {
                Some(choice) => {
                    self.dispatch(Command::SelectSuggestion(choice.name));
                    self.suggestion = None;
                }
                None => self.focus = Field::Quantity,
            },
            KeyCode::Down => self.focus = Field::Quantity,
            _ => {}
        }
    }

    fn on_catalog_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Char('a') => {
                self.state.meal_input.clear();
                self.state.selected_meal = None;
                self.dispatch(Command::OpenAddPopup);
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(entry) = self.selected_catalog_entry() {
                    let name = entry.name.clone();
                    self.dispatch(Command::OpenEdit(name));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(entry) = self.selected_catalog_entry() {
                    let name = entry.name.clone();
                    self.dispatch(Command::DeleteMeal(name));
                }
            }
            KeyCode::Char('R') => self.reseed(),
            _ => {}
        }
        false
    }

    fn on_popup_key(&mut self, key: KeyEvent) {
        let (name, category) = match (&self.state.add_popup, &self.state.edit_target) {
            (Some(popup), _) => (popup.name.clone(), popup.category),
            (None, Some(target)) => (target.name.clone(), target.category),
            (None, None) => return,
        };

        match key.code {
            KeyCode::Esc => self.dispatch(Command::CancelPopup),
            KeyCode::Enter => {
                if self.state.add_popup.is_some() {
                    self.dispatch(Command::ConfirmAdd);
                } else {
                    self.dispatch(Command::ConfirmEdit);
                }
            }
            KeyCode::Left => self.dispatch(Command::SetPopupCategory(category.previous())),
            KeyCode::Right => self.dispatch(Command::SetPopupCategory(category.next())),
            KeyCode::Backspace => {
                let mut name = name;
                name.pop();
                self.dispatch(Command::SetPopupName(name));
            }
            KeyCode::Char(c) => {
                let mut name = name;
                name.push(c);
                self.dispatch(Command::SetPopupName(name));
            }
            _ => {}
        }
    }

    fn sync_quantity(&mut self) {
        let quantity = self.quantity_input.parse::<f64>().unwrap_or(0.0);
        self.dispatch(Command::SetQuantity(quantity));
    }

    fn state_rejected(&self) -> bool {
        matches!(
            self.state.status,
            Some(Status {
                kind: NotificationKind::Error | NotificationKind::Warning,
                ..
            })
        )
    }

    pub fn next(&mut self) {
        let len = self.catalog.len();
        if len == 0 {
            return;
        }
        let i = match self.catalog_state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.catalog_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.catalog.len();
        if len == 0 {
            return;
        }
        let i = match self.catalog_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.catalog_state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.on_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::LogMeal => render_log_page(f, chunks[1], app),
        Page::Catalog => render_catalog(f, chunks[1], app),
        Page::History => render_history(f, chunks[1], app),
        Page::Notifications => render_notifications(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    if app.state.popup_open() {
        render_popup(f, app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::LogMeal, Page::Catalog, Page::History, Page::Notifications];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Meals: {}", app.catalog.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" yourLifeCoach "),
    );

    f.render_widget(header, area);
}

fn field_style(app: &App, field: Field) -> Style {
    if app.focus == field {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_log_page(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Meal input
            Constraint::Length(3), // Quantity + category
            Constraint::Min(0),    // Suggestions
        ])
        .split(area);

    let meal = Paragraph::new(app.state.meal_input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(field_style(app, Field::Meal))
            .title(" Start typing meal name... "),
    );
    f.render_widget(meal, chunks[0]);

    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let quantity = Paragraph::new(app.quantity_input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(field_style(app, Field::Quantity))
            .title(" Quantity (servings) "),
    );
    f.render_widget(quantity, row[0]);

    let category = Paragraph::new(format!("◀ {} ▶", app.state.category)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(field_style(app, Field::Category))
            .title(" Category "),
    );
    f.render_widget(category, row[1]);

    let matches = app.suggestions();
    let mut lines: Vec<Line> = Vec::new();

    if matches.is_empty() {
        if needs_catalog_entry(&app.state, &app.catalog) {
            lines.push(Line::from(Span::styled(
                format!("'{}' is not in your meal database. Ctrl+A to add it.", app.state.current_meal()),
                Style::default().fg(Color::Yellow),
            )));
        }
        if !app.state.meal_input.trim().is_empty() && app.state.selected_meal.is_none() {
            lines.push(Line::from(Span::styled(
                "💡 No matches found. You can add this as a new meal!",
                Style::default().fg(Color::DarkGray),
            )));
        }
    } else {
        for (i, m) in matches.iter().enumerate() {
            let category = app
                .catalog
                .iter()
                .find(|e| e.name == m.name)
                .map(|e| e.category.as_str())
                .unwrap_or("Unknown");
            let style = if app.suggestion == Some(i) {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:<45}", truncate(&m.name, 45)), style),
                Span::styled(format!(" {}", category), Style::default().fg(Color::DarkGray)),
            ]));
        }
    }

    let suggestions = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Suggestions "),
    );
    f.render_widget(suggestions, chunks[2]);
}

fn render_catalog(f: &mut Frame, area: Rect, app: &mut App) {
    if app.catalog.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from("No meals in the database. The API may have failed to provide data."),
            Line::from(Span::styled(
                "Press R to try initializing the database again.",
                Style::default().fg(Color::Yellow),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title(" Meal Database "));
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["Meal", "Category"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.catalog.iter().map(|entry| {
        Row::new(vec![
            Cell::from(truncate(&entry.name, 60)),
            Cell::from(entry.category.as_str()),
        ])
        .height(1)
    });

    let table = Table::new(rows, [Constraint::Min(40), Constraint::Length(12)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Database contains {} meals ", app.catalog.len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.catalog_state);
}

fn render_history(f: &mut Frame, area: Rect, app: &App) {
    let header_cells = ["Date", "Category", "Meal", "Quantity"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.logs.iter().map(|entry| {
        Row::new(vec![
            Cell::from(entry.timestamp.format(TIMESTAMP_FORMAT).to_string()),
            Cell::from(entry.category.as_str()),
            Cell::from(truncate(&entry.name, 40)),
            Cell::from(format!("{}", entry.quantity)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(21),
            Constraint::Length(11),
            Constraint::Min(30),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Recent Meal Logs "),
    );

    f.render_widget(table, area);
}

fn kind_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Success => Color::Green,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Error => Color::Red,
        NotificationKind::Info => Color::Cyan,
    }
}

fn render_notifications(f: &mut Frame, area: Rect, app: &App) {
    let shown = if app.state.show_all_notifications {
        app.notifications.len()
    } else {
        FEED_SIZE
    };

    let mut lines: Vec<Line> = Vec::new();
    if app.notifications.is_empty() {
        lines.push(Line::from("🔔 No notifications yet."));
    }

    for n in app.notifications.iter().take(shown) {
        lines.push(Line::from(vec![
            Span::styled("▌ ", Style::default().fg(kind_color(n.kind))),
            Span::raw(n.message.clone()),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  {}", n.timestamp.format(TIMESTAMP_FORMAT)),
            Style::default().fg(Color::DarkGray),
        )));
    }

    if !app.state.show_all_notifications && app.notifications.len() > FEED_SIZE {
        lines.push(Line::from(Span::styled(
            format!("📋 Press a to show all {} notifications", app.notifications.len()),
            Style::default().fg(Color::Yellow),
        )));
    }

    let feed = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" 🔔 Notifications "),
    );
    f.render_widget(feed, area);
}

fn render_popup(f: &mut Frame, app: &App) {
    let (title, name, category) = match (&app.state.add_popup, &app.state.edit_target) {
        (Some(popup), _) => (" ➕ Add Meal to Database ", popup.name.clone(), popup.category),
        (None, Some(target)) => (" ✏️ Edit Meal ", target.name.clone(), target.category),
        (None, None) => return,
    };

    let area = centered_rect(60, 9, f.size());
    f.render_widget(Clear, area);

    let text = vec![
        Line::from(vec![
            Span::styled("Meal Name: ", Style::default().fg(Color::Yellow)),
            Span::raw(name),
        ]),
        Line::from(vec![
            Span::styled("Category:  ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("◀ {} ▶", category)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter confirm | Esc cancel | ←/→ category",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );
    f.render_widget(popup, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(status) = &app.state.status {
        status_spans.push(Span::styled(
            format!(" {} ", status.message),
            Style::default().fg(kind_color(status.kind)),
        ));
        status_spans.push(Span::raw(" | "));
    }

    let hints: &[(&str, &str)] = match app.current_page {
        Page::LogMeal => &[("↑/↓", "Suggest"), ("Enter", "Next"), ("Ctrl+S", "Save"), ("Ctrl+A", "Add")],
        Page::Catalog => &[("a", "Add"), ("e", "Edit"), ("d", "Delete"), ("R", "Reseed")],
        Page::History => &[],
        Page::Notifications => &[("a", "Show all")],
    };

    for (key, label) in hints {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(format!(" {} | ", label)));
    }
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meal_journal::MealCategory;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_type_pick_suggestion_and_save() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_data_dir(dir.path());
        let journal = Journal::open(&config).unwrap();
        journal.catalog.add("Grilled Chicken", MealCategory::Dinner).unwrap();
        journal.catalog.add("Apple", MealCategory::Snack1).unwrap();

        let mut app = App::new(&journal, &config).unwrap();
        type_text(&mut app, "chick");
        assert_eq!(app.suggestions().len(), 1);

        app.on_key(key(KeyCode::Down));
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.state.selected_meal.as_deref(), Some("Grilled Chicken"));
        assert_eq!(app.state.category, MealCategory::Dinner);

        app.on_key(key(KeyCode::Enter)); // to quantity
        type_text(&mut app, "1.5");
        app.on_key(ctrl('s'));

        let logs = journal.log_entries().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].name, "Grilled Chicken");
        assert_eq!(logs[0].quantity, 1.5);
    }

    #[test]
    fn test_catalog_page_delete_and_quit() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_data_dir(dir.path());
        let journal = Journal::open(&config).unwrap();
        journal.catalog.add("Apple", MealCategory::Snack1).unwrap();

        let mut app = App::new(&journal, &config).unwrap();
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.current_page, Page::Catalog);

        app.on_key(key(KeyCode::Char('d')));
        assert!(journal.catalog.entries().unwrap().is_empty());
        assert!(app.on_key(key(KeyCode::Char('q'))));
    }

    #[test]
    fn test_add_popup_from_log_page() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_data_dir(dir.path());
        let journal = Journal::open(&config).unwrap();

        let mut app = App::new(&journal, &config).unwrap();
        type_text(&mut app, "Pizza");
        app.on_key(ctrl('a'));
        assert!(app.state.add_popup.is_some());

        // typing goes to the popup, not the page
        type_text(&mut app, "!");
        app.on_key(key(KeyCode::Right));
        app.on_key(key(KeyCode::Enter));

        assert_eq!(
            journal.catalog.category_of("Pizza!").unwrap(),
            Some(MealCategory::Lunch)
        );
        assert!(!app.state.popup_open());
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Crème brûlée tart", 10), "Crème b...");
        assert_eq!(truncate("Tea", 10), "Tea");
    }
}
