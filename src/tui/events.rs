//! Terminal input for the interactive TUI.

use crate::error::{DbChatError, Result};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;

/// How long `next` blocks before reporting a tick.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// No input arrived within the poll interval.
    Tick,
}

impl From<CrosstermEvent> for Event {
    fn from(event: CrosstermEvent) -> Self {
        match event {
            // Windows reports releases too; only presses edit the input.
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Self::Key(key),
            CrosstermEvent::Resize(width, height) => Self::Resize(width, height),
            _ => Self::Tick,
        }
    }
}

/// Polls crossterm for the next event.
#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Waits up to the poll interval for input.
    pub fn next(&self) -> Result<Event> {
        let ready = event::poll(POLL_INTERVAL)
            .map_err(|e| DbChatError::internal(format!("Failed to poll events: {e}")))?;
        if !ready {
            return Ok(Event::Tick);
        }

        event::read()
            .map(Event::from)
            .map_err(|e| DbChatError::internal(format!("Failed to read event: {e}")))
    }
}
