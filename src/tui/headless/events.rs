//! Event DSL parser for headless mode.
//!
//! Parses event strings like "key:enter", "type:hello", "wait:100ms" into
//! executable events.

use crate::error::{DbChatError, Result};
use crate::tui::app::App;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;
use std::time::Duration;

/// An assertion to check against the screen or state.
#[derive(Debug, Clone)]
pub enum Assertion {
    /// Screen contains text (case-insensitive).
    Contains(String),
    /// Screen does not contain text (case-insensitive).
    NotContains(String),
    /// Screen matches regex pattern.
    Matches(String),
    /// State field compared with a value (=, >=, <=, >, <).
    State {
        field: String,
        op: String,
        value: String,
    },
}

impl Assertion {
    /// Checks the assertion against the screen and app state.
    pub fn check(&self, screen: &str, app: &App) -> bool {
        match self {
            Self::Contains(text) => screen.to_lowercase().contains(&text.to_lowercase()),
            Self::NotContains(text) => !screen.to_lowercase().contains(&text.to_lowercase()),
            Self::Matches(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(screen))
                .unwrap_or(false),
            Self::State { field, op, value } => {
                compare_values(state_field(app, field).as_deref(), op, value)
            }
        }
    }
}

/// Reads a named state field from the app.
pub fn state_field(app: &App, field: &str) -> Option<String> {
    match field {
        "focus" => Some(app.focus.as_str().to_string()),
        "input_text" => Some(app.input.text.clone()),
        "message_count" => Some(app.session.messages().len().to_string()),
        "connected" => Some(app.is_connected().to_string()),
        "running" => Some(app.running.to_string()),
        "notice" => Some(
            app.notice
                .as_ref()
                .map(|n| n.message.clone())
                .unwrap_or_default(),
        ),
        "selected_field" => Some(app.form.selected.to_string()),
        _ => None,
    }
}

fn compare_values(actual: Option<&str>, op: &str, expected: &str) -> bool {
    let Some(actual) = actual else {
        return false;
    };

    if let (Ok(a), Ok(e)) = (actual.parse::<i64>(), expected.parse::<i64>()) {
        return match op {
            ">=" => a >= e,
            "<=" => a <= e,
            ">" => a > e,
            "<" => a < e,
            _ => a == e,
        };
    }

    op == "=" && actual == expected
}

/// A parsed event that can be executed.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// Type text into the focused panel.
    Type(String),
    /// Wait for a duration.
    Wait(Duration),
    /// Resize the terminal.
    Resize(u16, u16),
    /// Assert something about the screen or state.
    Assert(Assertion),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => {
                let prefix = if key.modifiers.contains(KeyModifiers::CONTROL) {
                    "ctrl+"
                } else {
                    ""
                };
                write!(f, "key:{}{}", prefix, key_code_name(&key.code))
            }
            Self::Type(text) => write!(f, "type:{}", text),
            Self::Wait(d) => write!(f, "wait:{}ms", d.as_millis()),
            Self::Resize(w, h) => write!(f, "resize:{}x{}", w, h),
            Self::Assert(Assertion::Contains(t)) => write!(f, "assert:contains:{}", t),
            Self::Assert(Assertion::NotContains(t)) => write!(f, "assert:not-contains:{}", t),
            Self::Assert(Assertion::Matches(p)) => write!(f, "assert:matches:{}", p),
            Self::Assert(Assertion::State { field, op, value }) => {
                write!(f, "assert:state:{}{}{}", field, op, value)
            }
        }
    }
}

fn key_code_name(code: &KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "backtab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        _ => "unknown".to_string(),
    }
}

/// Parser for the event DSL.
#[derive(Debug, Default)]
pub struct EventParser;

impl EventParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses all events from an input string.
    ///
    /// Lines are split on commas, except `type:` lines, which keep the rest
    /// of the line so questions may contain commas. `#` starts a comment line.
    pub fn parse_all(&self, input: &str) -> Result<Vec<Event>> {
        let mut events = Vec::new();

        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.to_lowercase().starts_with("type:") {
                events.push(self.parse_one(line)?);
                continue;
            }

            for part in line.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                events.push(self.parse_one(part)?);
            }
        }

        Ok(events)
    }

    /// Parses a single event string.
    pub fn parse_one(&self, input: &str) -> Result<Event> {
        let input = input.trim();

        let Some((event_type, value)) = input.split_once(':') else {
            return Err(DbChatError::config(format!(
                "Invalid event syntax: '{}'. Expected format: type:value",
                input
            )));
        };

        match event_type.trim().to_lowercase().as_str() {
            "key" => self.parse_key(value.trim()),
            // Leading spaces are kept so "type: x" types " x".
            "type" => Ok(Event::Type(value.to_string())),
            "wait" => self.parse_wait(value.trim()),
            "resize" => self.parse_resize(value.trim()),
            "assert" => self.parse_assert(value.trim()),
            other => Err(DbChatError::config(format!(
                "Unknown event type: '{}'. Valid types: key, type, wait, resize, assert",
                other
            ))),
        }
    }

    /// Parses a key event like "enter", "ctrl+c".
    fn parse_key(&self, value: &str) -> Result<Event> {
        let (modifiers, key) = match value.rsplit_once('+') {
            Some((mods, key)) if !key.is_empty() => (self.parse_modifiers(mods)?, key),
            _ => (KeyModifiers::NONE, value),
        };

        let code = match key.to_lowercase().as_str() {
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "backspace" | "bs" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        return Err(DbChatError::config(format!(
                            "Unknown key: '{}'. Use single characters or named keys like enter, esc, tab",
                            key
                        )))
                    }
                }
            }
        };

        Ok(Event::Key(KeyEvent::new(code, modifiers)))
    }

    fn parse_modifiers(&self, mods: &str) -> Result<KeyModifiers> {
        let mut modifiers = KeyModifiers::NONE;
        for part in mods.split('+') {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => {
                    return Err(DbChatError::config(format!(
                        "Unknown modifier: '{}'. Valid modifiers: ctrl, alt, shift",
                        part
                    )))
                }
            }
        }
        Ok(modifiers)
    }

    /// Parses a wait duration like "100ms", "2s", or just "100" (milliseconds).
    fn parse_wait(&self, value: &str) -> Result<Event> {
        let value = value.to_lowercase();
        let invalid = || DbChatError::config(format!("Invalid duration: '{}'", value));

        let duration = if let Some(ms) = value.strip_suffix("ms") {
            Duration::from_millis(ms.parse().map_err(|_| invalid())?)
        } else if let Some(secs) = value.strip_suffix('s') {
            Duration::from_secs(secs.parse().map_err(|_| invalid())?)
        } else {
            Duration::from_millis(value.parse().map_err(|_| invalid())?)
        };

        Ok(Event::Wait(duration))
    }

    /// Parses a resize event like "120x40".
    fn parse_resize(&self, value: &str) -> Result<Event> {
        let invalid = || {
            DbChatError::config(format!(
                "Invalid resize format: '{}'. Expected WIDTHxHEIGHT",
                value
            ))
        };
        let (w, h) = value.split_once('x').ok_or_else(invalid)?;
        let width = w.parse().map_err(|_| invalid())?;
        let height = h.parse().map_err(|_| invalid())?;
        Ok(Event::Resize(width, height))
    }

    /// Parses an assertion like "contains:hello" or "state:connected=true".
    fn parse_assert(&self, value: &str) -> Result<Event> {
        let Some((kind, rest)) = value.split_once(':') else {
            return Err(DbChatError::config(format!(
                "Invalid assertion syntax: '{}'. Expected assert:type:value",
                value
            )));
        };
        let rest = rest.trim().to_string();

        let assertion = match kind.trim().to_lowercase().as_str() {
            "contains" => Assertion::Contains(rest),
            "not-contains" => Assertion::NotContains(rest),
            "matches" => Assertion::Matches(rest),
            "state" => self.parse_state_assertion(&rest)?,
            other => {
                return Err(DbChatError::config(format!(
                    "Unknown assertion type: '{}'. Valid types: contains, not-contains, matches, state",
                    other
                )))
            }
        };

        Ok(Event::Assert(assertion))
    }

    fn parse_state_assertion(&self, value: &str) -> Result<Assertion> {
        for op in [">=", "<=", ">", "<", "="] {
            if let Some((field, expected)) = value.split_once(op) {
                return Ok(Assertion::State {
                    field: field.trim().to_string(),
                    op: op.to_string(),
                    value: expected.trim().to_string(),
                });
            }
        }

        Err(DbChatError::config(format!(
            "Invalid state assertion: '{}'. Expected field=value or field>=value",
            value
        )))
    }
}
