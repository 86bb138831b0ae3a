//! Google Gemini LLM client implementation.
//!
//! Implements the LlmClient trait for the Gemini `generateContent` REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{DbChatError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "gemini-1.5-pro").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// API base URL, without trailing slash.
    pub base_url: String,
}

impl GeminiConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Points the client at a different endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Gemini LLM client. Makes exactly one request per completion.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    /// Creates a new Gemini client with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DbChatError::llm(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Converts internal messages to Gemini contents.
    fn convert_messages(messages: &[Message]) -> Vec<GeminiContent> {
        messages
            .iter()
            .map(|m| GeminiContent {
                role: match m.role {
                    Role::User => "user".to_string(),
                    Role::Assistant => "model".to_string(),
                },
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect()
    }

    /// Parses an API error response.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> DbChatError {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return DbChatError::llm("Authentication failed. Check your GEMINI_API_KEY.");
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return DbChatError::llm("Quota exceeded or rate limited by the Gemini API.");
        }

        if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(body) {
            // Gemini reports an invalid key as 400 INVALID_ARGUMENT.
            if error_response.error.message.contains("API key") {
                return DbChatError::llm(format!(
                    "Authentication failed: {}",
                    error_response.error.message
                ));
            }
            return DbChatError::llm(format!(
                "Gemini API error ({}): {}",
                error_response.error.status.unwrap_or_else(|| status.to_string()),
                error_response.error.message
            ));
        }

        DbChatError::llm(format!("Gemini API error ({status}): {body}"))
    }

    /// Extracts the concatenated text of the first candidate.
    fn parse_response(body: &str) -> Result<String> {
        let response: GeminiResponse = serde_json::from_str(body)
            .map_err(|e| DbChatError::llm(format!("Failed to parse response: {e}")))?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| match response.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => DbChatError::llm(format!("Prompt blocked by Gemini: {reason}")),
                None => DbChatError::llm("No response from Gemini"),
            })?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(DbChatError::llm(format!(
                "Empty response from Gemini (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = GeminiRequest {
            contents: Self::convert_messages(messages),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DbChatError::llm("Request timed out. Try again.")
                } else if e.is_connect() {
                    DbChatError::llm("Failed to connect to the Gemini API. Check your network.")
                } else {
                    DbChatError::llm(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DbChatError::llm(format!("Failed to read response: {e}")))?;

        debug!(
            "Gemini {} responded {} in {:?}",
            self.config.model,
            status,
            start.elapsed()
        );

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        Self::parse_response(&body)
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    #[test]
    fn test_config_new() {
        let config = GeminiConfig::new("key", DEFAULT_GEMINI_MODEL);
        assert_eq!(config.api_key, "key");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(
            config.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_config_builders() {
        let config = GeminiConfig::new("key", "gemini-1.5-flash")
            .with_timeout(5)
            .with_base_url("http://localhost:8080/");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(
            config.endpoint(),
            "http://localhost:8080/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_convert_messages() {
        let converted = GeminiClient::convert_messages(&[
            Message::user("question"),
            Message::assistant("answer"),
        ]);

        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "user");
        assert_eq!(converted[1].role, "model");
        assert_eq!(converted[0].parts[0].text, "question");
    }

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: GeminiClient::convert_messages(&[Message::user("hi")]),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn test_parse_response_concatenates_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "SELECT "}, {"text": "1"}]},
                "finishReason": "STOP"
            }]
        }"#;
        assert_eq!(GeminiClient::parse_response(body).unwrap(), "SELECT 1");
    }

    #[test]
    fn test_parse_response_blocked_prompt() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let err = GeminiClient::parse_response(body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_parse_response_empty_candidate() {
        let body = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        let err = GeminiClient::parse_response(body).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn test_parse_error_auth() {
        let err = GeminiClient::parse_error(StatusCode::FORBIDDEN, "");
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_parse_error_quota() {
        let err = GeminiClient::parse_error(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(err.to_string().contains("Quota"));
    }

    #[test]
    fn test_parse_error_invalid_key_body() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        let err = GeminiClient::parse_error(StatusCode::BAD_REQUEST, body);
        assert!(err.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_parse_error_api_body() {
        let body = r#"{"error": {"code": 404, "message": "models/nope is not found", "status": "NOT_FOUND"}}"#;
        let err = GeminiClient::parse_error(StatusCode::NOT_FOUND, body);
        assert_eq!(
            err.to_string(),
            "LLM error: Gemini API error (NOT_FOUND): models/nope is not found"
        );
    }
}
