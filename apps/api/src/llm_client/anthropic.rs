use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{send_with_retry, CompletionRequest, CompletionService, LlmError, LlmProvider};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    /// Concatenated text of every text block.
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic Messages API backend.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    max_attempts: u32,
}

impl AnthropicClient {
    pub fn new(client: Client, api_key: String, model: String, max_attempts: u32) -> Self {
        Self {
            client,
            api_key,
            model,
            max_attempts,
        }
    }
}

#[async_trait]
impl CompletionService for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: request.prompt,
            }],
        };

        let response = send_with_retry(
            LlmProvider::Anthropic,
            self.max_attempts,
            || {
                self.client
                    .post(ANTHROPIC_API_URL)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .header("content-type", "application/json")
                    .json(&body)
            },
            |body| {
                serde_json::from_str::<AnthropicError>(body)
                    .ok()
                    .map(|e| e.error.message)
            },
        )
        .await?;

        let parsed: MessagesResponse = response.json().await?;
        debug!(
            "Anthropic call succeeded: input_tokens={}, output_tokens={}, stop_reason={:?}",
            parsed.usage.input_tokens, parsed.usage.output_tokens, parsed.stop_reason
        );

        if parsed.stop_reason.as_deref() == Some("refusal") {
            return Err(LlmError::Blocked("model refused the request".to_string()));
        }

        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text)
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_joins_text_blocks_only() {
        let response: MessagesResponse = serde_json::from_str(
            r####"{
                "content": [
                    {"type": "text", "text": "### Job #1: "},
                    {"type": "tool_use"},
                    {"type": "text", "text": "Engineer"}
                ],
                "stop_reason": "max_tokens",
                "usage": {"input_tokens": 10, "output_tokens": 5}
            }"####,
        )
        .unwrap();
        assert_eq!(response.text(), "### Job #1: Engineer");
    }

    #[test]
    fn test_request_serializes_temperature_and_system() {
        let body = AnthropicRequest {
            model: "claude-sonnet-4-5",
            max_tokens: 1000,
            temperature: 0.5,
            system: "You are a recruiter.",
            messages: vec![AnthropicMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["system"], "You are a recruiter.");
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
