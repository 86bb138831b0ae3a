//! SQL assistant: question in, narrated answer out.
//!
//! A turn is two model calls with one database execution in between. The
//! generated SQL is taken verbatim and never shown in the chat log.

use crate::connection::DatabaseHandle;
use crate::error::DbChatError;
use crate::llm::{build_response_prompt, build_sql_prompt, Conversation, LlmClient};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reply shown to the user when any stage of a turn fails.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request. \
This could be due to hitting the API limit or other issues. Please try again later.";

/// The stage at which a turn failed.
#[derive(Error, Debug)]
pub enum TurnError {
    /// Fetching the schema snapshot failed.
    #[error("schema snapshot failed: {0}")]
    Schema(#[source] DbChatError),

    /// The SQL generation call failed.
    #[error("SQL generation failed: {0}")]
    SqlGeneration(#[source] DbChatError),

    /// The database rejected the generated SQL.
    #[error("executing `{sql}` failed: {source}")]
    Execution {
        sql: String,
        #[source]
        source: DbChatError,
    },

    /// The narration call failed.
    #[error("narration failed: {source}")]
    Narration {
        sql: String,
        #[source]
        source: DbChatError,
    },
}

impl TurnError {
    /// Short stage name for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Schema(_) => "schema",
            Self::SqlGeneration(_) => "sql_generation",
            Self::Execution { .. } => "execution",
            Self::Narration { .. } => "narration",
        }
    }

    /// The underlying error.
    pub fn cause(&self) -> &DbChatError {
        match self {
            Self::Schema(e) | Self::SqlGeneration(e) => e,
            Self::Execution { source, .. } | Self::Narration { source, .. } => source,
        }
    }

    /// The generated SQL, when the turn got that far.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Execution { sql, .. } | Self::Narration { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

/// Turns questions into SQL, runs it and narrates the result.
pub struct SqlAssistant {
    llm: Box<dyn LlmClient>,
}

impl SqlAssistant {
    pub fn new(llm: Box<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Asks the model for one SQL statement answering the latest question.
    ///
    /// The schema is fetched fresh. The reply is returned as-is.
    pub async fn generate_sql(
        &self,
        handle: &DatabaseHandle,
        history: &Conversation,
    ) -> Result<String, TurnError> {
        let schema = handle.table_info().await.map_err(TurnError::Schema)?;
        let messages = build_sql_prompt(&schema, history);
        debug!("SQL prompt: {} chars", messages[0].content.len());

        self.llm
            .complete(&messages)
            .await
            .map_err(TurnError::SqlGeneration)
    }

    /// Runs a full turn and returns the model's narration.
    ///
    /// `history` must already contain `question` as its last message.
    pub async fn generate_response(
        &self,
        question: &str,
        handle: &DatabaseHandle,
        history: &Conversation,
    ) -> Result<String, TurnError> {
        let start = Instant::now();
        let sql = self.generate_sql(handle, history).await?;
        debug!("Generated SQL: {}", sql);

        let schema = match handle.table_info().await {
            Ok(schema) => schema,
            Err(e) => return Err(TurnError::Schema(e)),
        };

        let response = match handle.run(&sql).await {
            Ok(response) => response,
            Err(source) => return Err(TurnError::Execution { sql, source }),
        };

        let messages = build_response_prompt(&schema, history, &sql, question, &response);
        debug!("Narration prompt: {} chars", messages[0].content.len());

        match self.llm.complete(&messages).await {
            Ok(answer) => {
                info!("Answered turn in {:?}", start.elapsed());
                Ok(answer)
            }
            Err(source) => Err(TurnError::Narration { sql, source }),
        }
    }

    /// Like [`generate_response`](Self::generate_response), but never fails:
    /// any error is logged and replaced by [`GENERIC_ERROR_MESSAGE`].
    pub async fn answer(
        &self,
        question: &str,
        handle: &DatabaseHandle,
        history: &Conversation,
    ) -> String {
        match self.generate_response(question, handle, history).await {
            Ok(answer) => answer,
            Err(e) => {
                log_turn_error(&e);
                GENERIC_ERROR_MESSAGE.to_string()
            }
        }
    }
}

pub(crate) fn log_turn_error(error: &TurnError) {
    warn!(
        stage = error.stage(),
        category = error.cause().category(),
        sql = error.sql().unwrap_or(""),
        "Turn failed: {}",
        error
    );
}
