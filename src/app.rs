//! Core orchestrator for db-chat.
//!
//! Wires the connector and the assistant to a session. Both the interactive
//! TUI and the headless runner drive the application through this type.

use crate::assistant::{log_turn_error, SqlAssistant, TurnError, GENERIC_ERROR_MESSAGE};
use crate::config::ConnectionConfig;
use crate::connection::Connector;
use crate::error::DbChatError;
use crate::llm::LlmClient;
use crate::session::Session;
use tracing::{info, warn};

/// Shown while a connection attempt is in flight.
pub const CONNECTING_MESSAGE: &str = "Connecting to database...";

/// Shown after a successful connect.
pub const CONNECTED_MESSAGE: &str = "Connected to the database!";

/// Shown when a message is submitted without a connection.
pub const NOT_CONNECTED_MESSAGE: &str =
    "Database not connected. Please connect to the database first.";

/// Result of a connect request.
#[derive(Debug)]
pub enum ConnectOutcome {
    /// The session now holds a new handle.
    Connected { display: String },
    /// The attempt failed; the session's handle is unchanged.
    Failed { error: DbChatError },
}

impl ConnectOutcome {
    /// The notice text for the UI.
    pub fn notice(&self) -> String {
        match self {
            Self::Connected { .. } => CONNECTED_MESSAGE.to_string(),
            Self::Failed { error } => format!("Failed to connect: {}", error.message()),
        }
    }
}

/// Result of submitting chat input.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The assistant's answer was appended.
    Answered,
    /// The turn failed; the generic message was appended.
    Failed { error: TurnError },
    /// Only the user message was appended.
    NotConnected,
    /// Empty input; nothing changed.
    Ignored,
}

/// The main orchestrator that coordinates all components.
pub struct Orchestrator {
    connector: Connector,
    assistant: SqlAssistant,
}

impl Orchestrator {
    /// Creates a new orchestrator using the given model client.
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self {
            connector: Connector::new(),
            assistant: SqlAssistant::new(llm),
        }
    }

    /// Connects and installs the new handle in the session.
    ///
    /// On failure the existing handle, if any, stays in place.
    pub async fn connect(&self, session: &mut Session, config: &ConnectionConfig) -> ConnectOutcome {
        match self.connector.connect(config).await {
            Ok(handle) => {
                let display = handle.display_string().to_string();
                if let Some(old) = session.set_handle(handle) {
                    info!("Replaced connection to {}", old.display_string());
                }
                ConnectOutcome::Connected { display }
            }
            Err(error) => {
                warn!("Connect to {} failed: {}", config.display_string(), error);
                ConnectOutcome::Failed { error }
            }
        }
    }

    /// Appends the user message and, when connected, the assistant's reply.
    pub async fn handle_input(&self, session: &mut Session, input: &str) -> TurnOutcome {
        if !self.accept_input(session, input) {
            return TurnOutcome::Ignored;
        }
        self.respond(session, input).await
    }

    /// Appends `input` to the log as a user message.
    ///
    /// Only empty input is refused; whitespace is a message like any other.
    pub fn accept_input(&self, session: &mut Session, input: &str) -> bool {
        if input.is_empty() {
            return false;
        }
        session.push_user(input);
        true
    }

    /// Answers `input`, which must already be the last message in the log.
    pub async fn respond(&self, session: &mut Session, input: &str) -> TurnOutcome {
        let Some(handle) = session.handle() else {
            return TurnOutcome::NotConnected;
        };

        let result = self
            .assistant
            .generate_response(input, handle, session.history())
            .await;

        match result {
            Ok(answer) => {
                session.push_assistant(answer);
                TurnOutcome::Answered
            }
            Err(error) => {
                log_turn_error(&error);
                session.push_assistant(GENERIC_ERROR_MESSAGE);
                TurnOutcome::Failed { error }
            }
        }
    }

    /// Closes the session's handle, if any.
    pub async fn shutdown(&self, session: &mut Session) {
        if let Some(handle) = session.take_handle() {
            if let Err(e) = handle.close().await {
                warn!("Failed to close database connection: {}", e);
            }
        }
    }
}
