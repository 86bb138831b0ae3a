//! Application state for the TUI.
//!
//! Contains the main App struct and related types for managing UI state.

use super::text::{byte_index, previous_word_start};
use super::ui::chat_area;
use super::widgets::chat;
use crate::app::{
    ConnectOutcome, TurnOutcome, CONNECTED_MESSAGE, CONNECTING_MESSAGE, NOT_CONNECTED_MESSAGE,
};
use crate::assistant::GENERIC_ERROR_MESSAGE;
use crate::config::ConnectionConfig;
use crate::db::DatabaseBackend;
use crate::session::Session;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

/// How long success notices stay visible.
pub const NOTICE_DURATION: Duration = Duration::from_secs(5);

/// Lines scrolled per PageUp/PageDown.
const PAGE_SCROLL: usize = 10;

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Sidebar,
}

impl Focus {
    /// Cycles to the next focus panel.
    pub fn next(self) -> Self {
        match self {
            Self::Input => Self::Sidebar,
            Self::Sidebar => Self::Input,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Sidebar => "sidebar",
        }
    }
}

/// Input state for text editing. The cursor counts characters.
#[derive(Debug, Default)]
pub struct InputState {
    /// Current input text.
    pub text: String,
    /// Cursor position (character index).
    pub cursor: usize,
}

impl InputState {
    /// Creates a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        let at = byte_index(&self.text, self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = byte_index(&self.text, self.cursor);
            self.text.remove(at);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = byte_index(&self.text, self.cursor);
            self.text.remove(at);
        }
    }

    /// Deletes the word before the cursor (Ctrl+W).
    pub fn delete_word(&mut self) {
        let start = previous_word_start(&self.text, self.cursor);
        let from = byte_index(&self.text, start);
        let to = byte_index(&self.text, self.cursor);
        self.text.replace_range(from..to, "");
        self.cursor = start;
    }

    /// Moves the cursor left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves the cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    /// Moves the cursor to the start of the input.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor to the end of the input.
    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    /// Clears the input and returns the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Returns true if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One editable field of the connection form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    /// Rendered as asterisks.
    pub masked: bool,
}

impl FormField {
    fn new(label: &'static str, value: &str) -> Self {
        Self {
            label,
            value: value.to_string(),
            masked: false,
        }
    }

    /// The value as shown on screen.
    pub fn display_value(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// The sidebar connection form: five fields and a Connect button.
#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub fields: Vec<FormField>,
    /// Index into `fields`, or `fields.len()` for the Connect button.
    pub selected: usize,
    backend: DatabaseBackend,
}

impl SettingsForm {
    /// Fills the form from connection settings.
    pub fn from_config(config: &ConnectionConfig) -> Self {
        let mut password = FormField::new("Password", &config.password);
        password.masked = true;

        Self {
            fields: vec![
                FormField::new("Host", &config.host),
                FormField::new("Port", &config.port),
                FormField::new("User", &config.user),
                password,
                FormField::new("Database", &config.database),
            ],
            selected: 0,
            backend: config.backend,
        }
    }

    /// Reads the form back into connection settings, verbatim.
    pub fn to_config(&self) -> ConnectionConfig {
        let value = |i: usize| self.fields[i].value.clone();
        ConnectionConfig {
            backend: self.backend,
            host: value(0),
            port: value(1),
            user: value(2),
            password: value(3),
            database: value(4),
        }
    }

    pub fn is_connect_selected(&self) -> bool {
        self.selected == self.fields.len()
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % (self.fields.len() + 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = match self.selected {
            0 => self.fields.len(),
            n => n - 1,
        };
    }

    /// The selected field, unless the button is selected.
    pub fn selected_field_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.selected)
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A status message shown above the input.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    created_at: Instant,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            created_at: Instant::now(),
        }
    }

    /// Only success notices expire; the others stay until replaced.
    pub fn is_expired(&self) -> bool {
        self.kind == NoticeKind::Success && self.created_at.elapsed() >= NOTICE_DURATION
    }
}

/// What the runner should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Connect(ConnectionConfig),
    Submit(String),
    Quit,
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    /// Current focus panel.
    pub focus: Focus,
    /// Input field state.
    pub input: InputState,
    /// Sidebar connection form.
    pub form: SettingsForm,
    /// Handle and message log.
    pub session: Session,
    /// Current notice, if any.
    pub notice: Option<Notice>,
    /// Label shown in the header while a request is in flight.
    pub busy: Option<&'static str>,
    /// Chat scroll offset (lines from bottom), at most `max_chat_scroll`.
    pub chat_scroll: usize,
    /// Size of the screen the app was last drawn on.
    viewport: Rect,
}

impl App {
    /// Creates a new App with the form filled from `connection`.
    pub fn new(connection: &ConnectionConfig) -> Self {
        Self {
            running: true,
            focus: Focus::default(),
            input: InputState::new(),
            form: SettingsForm::from_config(connection),
            session: Session::new(),
            notice: None,
            busy: None,
            chat_scroll: 0,
            viewport: Rect::default(),
        }
    }

    /// Records the screen size so scrolling can stop at the top of the log.
    pub fn set_viewport(&mut self, screen: Rect) {
        self.viewport = screen;
        self.chat_scroll = self.chat_scroll.min(self.max_chat_scroll());
    }

    pub fn max_chat_scroll(&self) -> usize {
        chat::max_scroll(self.session.messages(), chat_area(self.viewport))
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn is_processing(&self) -> bool {
        self.busy.is_some()
    }

    /// Description of the live connection for the header.
    pub fn connection_info(&self) -> Option<&str> {
        self.session.handle().map(|h| h.display_string())
    }

    pub fn set_notice(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notice = Some(Notice::new(kind, message));
    }

    /// Drops the notice once it has expired.
    pub fn clear_expired_notice(&mut self) {
        if self.notice.as_ref().is_some_and(Notice::is_expired) {
            self.notice = None;
        }
    }

    /// Marks a connection attempt as in flight.
    pub fn begin_connect(&mut self) {
        self.busy = Some("Connecting...");
        self.set_notice(NoticeKind::Info, CONNECTING_MESSAGE);
    }

    pub fn finish_connect(&mut self, outcome: &ConnectOutcome) {
        self.busy = None;
        match outcome {
            ConnectOutcome::Connected { .. } => {
                self.set_notice(NoticeKind::Success, CONNECTED_MESSAGE)
            }
            ConnectOutcome::Failed { .. } => self.set_notice(NoticeKind::Error, outcome.notice()),
        }
    }

    /// Marks a chat turn as in flight.
    pub fn begin_turn(&mut self) {
        self.busy = Some("Thinking...");
        self.notice = None;
    }

    pub fn finish_turn(&mut self, outcome: &TurnOutcome) {
        self.busy = None;
        self.chat_scroll = 0;
        match outcome {
            TurnOutcome::Answered | TurnOutcome::Ignored => {}
            TurnOutcome::Failed { .. } => {
                self.set_notice(NoticeKind::Error, GENERIC_ERROR_MESSAGE)
            }
            TurnOutcome::NotConnected => {
                self.set_notice(NoticeKind::Error, NOT_CONNECTED_MESSAGE)
            }
        }
    }

    /// Handles a key press and returns the action for the runner.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.running = false;
                Action::Quit
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.next();
                Action::None
            }
            KeyCode::PageUp => {
                self.chat_scroll = self
                    .chat_scroll
                    .saturating_add(PAGE_SCROLL)
                    .min(self.max_chat_scroll());
                Action::None
            }
            KeyCode::PageDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(PAGE_SCROLL);
                Action::None
            }
            _ => match self.focus {
                Focus::Input => self.handle_input_key(key),
                Focus::Sidebar => self.handle_sidebar_key(key),
            },
        }
    }

    /// Handles key events when input is focused.
    fn handle_input_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('w') if ctrl => self.input.delete_word(),
            KeyCode::Char('u') if ctrl => {
                self.input.take();
            }
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(c) => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::Esc => {
                self.input.take();
            }
            KeyCode::Enter => {
                let text = self.input.take();
                if !text.is_empty() {
                    return Action::Submit(text);
                }
            }
            _ => {}
        }
        Action::None
    }

    /// Handles key events when the connection form is focused.
    fn handle_sidebar_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Up => self.form.select_prev(),
            KeyCode::Down => self.form.select_next(),
            KeyCode::Enter if self.form.is_connect_selected() => {
                return Action::Connect(self.form.to_config());
            }
            KeyCode::Enter => self.form.select_next(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(field) = self.form.selected_field_mut() {
                    field.value.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = self.form.selected_field_mut() {
                    field.value.pop();
                }
            }
            _ => {}
        }
        Action::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app() -> App {
        App::new(&ConnectionConfig::default())
    }

    #[test]
    fn test_input_insert() {
        let mut input = InputState::new();
        input.insert('h');
        input.insert('i');
        assert_eq!(input.text, "hi");
        assert_eq!(input.cursor, 2);
    }

    #[test]
    fn test_input_backspace_at_start() {
        let mut input = InputState::new();
        input.text = "hello".to_string();
        input.cursor = 0;
        input.backspace();
        assert_eq!(input.text, "hello");
        assert_eq!(input.cursor, 0);
    }

    #[test]
    fn test_input_unicode_editing() {
        let mut input = InputState::new();
        for c in "café".chars() {
            input.insert(c);
        }
        input.move_left();
        input.backspace();
        assert_eq!(input.text, "caé");
        input.move_end();
        input.delete();
        assert_eq!(input.cursor, 3);
    }

    #[test]
    fn test_input_delete_word() {
        let mut input = InputState::new();
        input.text = "how many albums".to_string();
        input.cursor = 15;
        input.delete_word();
        assert_eq!(input.text, "how many ");
        assert_eq!(input.cursor, 9);
    }

    #[test]
    fn test_focus_toggle() {
        let mut app = app();
        assert_eq!(app.focus, Focus::Input);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Sidebar);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Input);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert_eq!(app.handle_key(ctrl('q')), Action::Quit);
        assert!(!app.running);
    }

    #[test]
    fn test_enter_submits_input() {
        let mut app = app();
        for c in "How many albums?".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, Action::Submit("How many albums?".to_string()));
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_empty_enter_does_nothing() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);

        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::Submit(" ".to_string()));
    }

    #[test]
    fn test_form_defaults_and_mask() {
        let form = SettingsForm::from_config(&ConnectionConfig::default());
        let labels: Vec<&str> = form.fields.iter().map(|f| f.label).collect();
        assert_eq!(labels, vec!["Host", "Port", "User", "Password", "Database"]);
        assert_eq!(form.fields[3].display_value(), "*****");
        assert_eq!(form.to_config(), ConnectionConfig::default());
    }

    #[test]
    fn test_form_edit_and_connect() {
        let mut app = app();
        app.handle_key(key(KeyCode::Tab));

        // Host field: replace "localhost" with "db"
        for _ in 0.."localhost".len() {
            app.handle_key(key(KeyCode::Backspace));
        }
        app.handle_key(key(KeyCode::Char('d')));
        app.handle_key(key(KeyCode::Char('b')));

        // Enter walks the fields down to the button.
        for _ in 0..5 {
            assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        }
        assert!(app.form.is_connect_selected());

        match app.handle_key(key(KeyCode::Enter)) {
            Action::Connect(config) => {
                assert_eq!(config.host, "db");
                assert_eq!(config.database, "chinook");
            }
            other => panic!("expected Connect, got {other:?}"),
        }
    }

    #[test]
    fn test_form_selection_wraps() {
        let mut form = SettingsForm::from_config(&ConnectionConfig::default());
        form.select_prev();
        assert!(form.is_connect_selected());
        assert!(form.selected_field_mut().is_none());
        form.select_next();
        assert_eq!(form.selected, 0);
    }

    #[test]
    fn test_page_up_stops_at_top_of_log() {
        let mut app = app();
        app.set_viewport(Rect::new(0, 0, 100, 30));
        for i in 0..40 {
            app.session.push_user(format!("question {i}"));
        }
        let max = app.max_chat_scroll();
        assert!(max > 0);

        for _ in 0..100 {
            app.handle_key(key(KeyCode::PageUp));
        }
        assert_eq!(app.chat_scroll, max);

        for _ in 0..max.div_ceil(PAGE_SCROLL) {
            app.handle_key(key(KeyCode::PageDown));
        }
        assert_eq!(app.chat_scroll, 0);
    }

    #[test]
    fn test_page_up_with_short_log() {
        let mut app = app();
        app.set_viewport(Rect::new(0, 0, 100, 30));
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.chat_scroll, 0);
    }

    #[test]
    fn test_page_scroll() {
        let mut app = app();
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.chat_scroll, 10);
        app.handle_key(key(KeyCode::PageDown));
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.chat_scroll, 0);
    }

    #[test]
    fn test_turn_notices() {
        let mut app = app();
        app.begin_turn();
        assert!(app.is_processing());
        app.finish_turn(&TurnOutcome::NotConnected);
        assert!(!app.is_processing());
        assert_eq!(
            app.notice.as_ref().map(|n| n.message.as_str()),
            Some(NOT_CONNECTED_MESSAGE)
        );
    }

    #[test]
    fn test_connect_notices() {
        let mut app = app();
        app.begin_connect();
        assert_eq!(
            app.notice.as_ref().map(|n| n.message.as_str()),
            Some(CONNECTING_MESSAGE)
        );
        app.finish_connect(&ConnectOutcome::Connected {
            display: "chinook @ localhost:3306".to_string(),
        });
        assert_eq!(app.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Success));
    }

    #[test]
    fn test_error_notice_does_not_expire() {
        let notice = Notice {
            kind: NoticeKind::Error,
            message: "x".to_string(),
            created_at: Instant::now() - NOTICE_DURATION * 2,
        };
        assert!(!notice.is_expired());
    }
}
