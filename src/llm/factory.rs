//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::error::Result;
use crate::llm::{GeminiClient, GeminiConfig, LlmClient, LlmProvider, MockLlmClient};
use tracing::warn;

/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Creates an LLM client for the given provider.
///
/// For Gemini the key is `api_key` if given, else `GEMINI_API_KEY`. A missing
/// key is not an error here: the request goes out without one and the first
/// model call fails.
pub fn create_client(
    provider: LlmProvider,
    model: &str,
    api_key: Option<String>,
) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::Gemini => {
            let key = api_key
                .or_else(|| std::env::var(GEMINI_API_KEY_VAR).ok())
                .unwrap_or_else(|| {
                    warn!("{GEMINI_API_KEY_VAR} is not set; model calls will fail");
                    String::new()
                });
            Ok(Box::new(GeminiClient::new(GeminiConfig::new(key, model))?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}
