//! Mock LLM clients for testing.
//!
//! Provides deterministic responses derived from the prompt, so a full turn
//! can run without API calls.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{DbChatError, Result};
use crate::llm::prompt::SQL_INSTRUCTION;
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Mock LLM client that answers from patterns in the prompt.
///
/// SQL prompts get a query built from the latest question and the table
/// names in the schema. Narration prompts get the SQL result echoed back.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the prompt contains `pattern` (case-insensitive), the mock
    /// returns `response`. Custom mappings are checked first.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into().to_lowercase(), response.into()));
        self
    }

    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(pattern) {
                return response.clone();
            }
        }

        if input.contains(SQL_INSTRUCTION) {
            return mock_sql(input);
        }

        if let Some((_, result)) = input.rsplit_once("SQL Response: ") {
            return mock_narration(result);
        }

        "I can answer questions about the tables in your database.".to_string()
    }
}

/// Builds a query from the last `Human:` line and the `CREATE TABLE` names.
fn mock_sql(prompt: &str) -> String {
    let question = prompt
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("Human: "))
        .unwrap_or_default()
        .to_lowercase();

    let mut tables: Vec<&str> = prompt
        .lines()
        .filter_map(|line| line.strip_prefix("CREATE TABLE `"))
        .filter_map(|rest| rest.split('`').next())
        .collect();
    // Longest first so `album_track` wins over `album`.
    tables.sort_by_key(|name| std::cmp::Reverse(name.len()));

    let table = tables
        .into_iter()
        .find(|name| question.contains(&name.to_lowercase()));

    let counting = ["how many", "count", "number of"]
        .iter()
        .any(|kw| question.contains(kw));

    match table {
        Some(name) if counting => format!("SELECT COUNT(*) FROM {name}"),
        Some(name) => format!("SELECT * FROM {name} LIMIT 10"),
        None => "SELECT 1".to_string(),
    }
}

fn mock_narration(result: &str) -> String {
    let lines: Vec<&str> = result.lines().collect();
    match lines.as_slice() {
        [] => "The query returned no rows.".to_string(),
        [_, value] if !value.contains('\t') => format!("The answer is {value}."),
        _ => format!("Here is what I found:\n{result}"),
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let input = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(self.mock_response(&input))
    }
}

/// An LLM client that succeeds a fixed number of times and then fails.
#[derive(Debug, Default)]
pub struct FailingLlmClient {
    inner: MockLlmClient,
    successes: usize,
    calls: Arc<AtomicUsize>,
}

impl FailingLlmClient {
    /// Fails on every call.
    pub fn always() -> Self {
        Self::after(0)
    }

    /// Answers like [`MockLlmClient`] for the first `successes` calls.
    pub fn after(successes: usize) -> Self {
        Self {
            inner: MockLlmClient::new(),
            successes,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared call counter that stays readable after the client is boxed.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl LlmClient for FailingLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.successes {
            return self.inner.complete(messages).await;
        }
        Err(DbChatError::llm(
            "Quota exceeded or rate limited by the Gemini API.",
        ))
    }
}
