//! Per-user session state: the live handle and the message log.

use crate::connection::DatabaseHandle;
use crate::llm::{Conversation, Message};
use tracing::debug;

/// First message of every session.
pub const GREETING: &str = "Hello! I'm SQL assistant. Ask me anything about your database.";

/// The state of one chat session.
///
/// Holds at most one database handle. The log only grows.
#[derive(Debug)]
pub struct Session {
    handle: Option<DatabaseHandle>,
    history: Conversation,
}

impl Session {
    /// Creates a session with the greeting and no connection.
    pub fn new() -> Self {
        let mut history = Conversation::new();
        history.add_assistant(GREETING);
        Self {
            handle: None,
            history,
        }
    }

    pub fn handle(&self) -> Option<&DatabaseHandle> {
        self.handle.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Installs a new handle and returns the one it replaces.
    pub fn set_handle(&mut self, handle: DatabaseHandle) -> Option<DatabaseHandle> {
        debug!("Session now connected to {}", handle.display_string());
        self.handle.replace(handle)
    }

    /// Removes the handle, e.g. to close it on exit.
    pub fn take_handle(&mut self) -> Option<DatabaseHandle> {
        self.handle.take()
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    pub fn messages(&self) -> &[Message] {
        self.history.messages()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.add_user(content);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.add_assistant(content);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
