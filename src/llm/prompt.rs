//! Prompt construction for LLM requests.
//!
//! Each turn sends two prompts, both as a single user message: one asking
//! for SQL, one asking for a narration of the SQL result.

use crate::llm::types::{Conversation, Message};

/// Template for the SQL generation prompt.
const SQL_PROMPT_TEMPLATE: &str = r#"You are a data analyst at a company. You are interacting with a user who is asking you questions about the company's database.
Based on the table schema below, write a SQL query that would answer the user's question. Take the conversation history into account.

<SCHEMA>{schema}</SCHEMA>

Conversation History: {chat_history}

Write only the SQL query and nothing else. Do not wrap the SQL query in any other text, not even backticks."#;

/// Template for the narration prompt.
const RESPONSE_PROMPT_TEMPLATE: &str = r#"You are a data analyst at a company. You are interacting with a user who is asking you questions about the company's database.
Based on the table schema below, question, SQL query, and SQL response, write a natural language response.
<SCHEMA>{schema}</SCHEMA>

Conversation History: {chat_history}
SQL Query: <SQL>{query}</SQL>
User question: {question}
SQL Response: {response}"#;

/// Marker the SQL prompt always carries.
pub const SQL_INSTRUCTION: &str = "Write only the SQL query and nothing else.";

/// Fills `{name}` placeholders in a single left-to-right pass.
///
/// Substituted text is copied as-is and never scanned again. Braces that do
/// not name a known placeholder are kept literally.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let value = tail.find('}').and_then(|close| {
            let name = &tail[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Builds the SQL generation prompt.
pub fn build_sql_prompt(schema: &str, history: &Conversation) -> Vec<Message> {
    let chat_history = history.render_for_prompt();
    let text = fill_template(
        SQL_PROMPT_TEMPLATE,
        &[("schema", schema), ("chat_history", &chat_history)],
    );
    vec![Message::user(text)]
}

/// Builds the narration prompt from the generated SQL and its raw result.
pub fn build_response_prompt(
    schema: &str,
    history: &Conversation,
    query: &str,
    question: &str,
    response: &str,
) -> Vec<Message> {
    let chat_history = history.render_for_prompt();
    let text = fill_template(
        RESPONSE_PROMPT_TEMPLATE,
        &[
            ("schema", schema),
            ("chat_history", &chat_history),
            ("query", query),
            ("question", question),
            ("response", response),
        ],
    );
    vec![Message::user(text)]
}
