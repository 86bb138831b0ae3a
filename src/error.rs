//! Error types for db-chat.
//!
//! Defines the crate-wide error enum. Per-turn failures of the assistant
//! pipeline are described separately by [`crate::assistant::TurnError`].

use thiserror::Error;

/// Main error type for db-chat operations.
#[derive(Error, Debug)]
pub enum DbChatError {
    /// Database connection errors (host unreachable, access denied, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query and introspection errors (syntax errors, unknown tables, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// LLM API errors (quota, auth, timeouts, malformed responses)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, bad CLI values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (terminal failures, I/O)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DbChatError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(msg)
            | Self::Query(msg)
            | Self::Llm(msg)
            | Self::Config(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias using DbChatError.
pub type Result<T> = std::result::Result<T, DbChatError>;
