use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{send_with_retry, CompletionRequest, CompletionService, LlmError, LlmProvider};

/// Groq serves the OpenAI chat-completions protocol under this prefix.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions backend for OpenAI and OpenAI-compatible hosts (Groq).
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    provider: LlmProvider,
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_attempts: u32,
}

impl OpenAiCompatibleClient {
    pub fn new(
        provider: LlmProvider,
        client: Client,
        base_url: &str,
        api_key: String,
        model: String,
        max_attempts: u32,
    ) -> Self {
        Self {
            provider,
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
            max_attempts,
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompatibleClient {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: request.system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = send_with_retry(
            self.provider,
            self.max_attempts,
            || {
                self.client
                    .post(&self.endpoint)
                    .bearer_auth(&self.api_key)
                    .json(&body)
            },
            |body| {
                serde_json::from_str::<ApiErrorEnvelope>(body)
                    .ok()
                    .map(|e| e.error.message)
            },
        )
        .await?;

        let parsed: ChatResponse = response.json().await?;
        extract_choice_text(self.provider, parsed)
    }

    fn provider(&self) -> LlmProvider {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn extract_choice_text(provider: LlmProvider, parsed: ChatResponse) -> Result<String, LlmError> {
    if let Some(usage) = &parsed.usage {
        debug!(
            "{provider} call succeeded: prompt_tokens={}, completion_tokens={}",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyContent)?;

    match choice.finish_reason.as_deref() {
        Some("content_filter") => {
            return Err(LlmError::Blocked("content filter triggered".to_string()))
        }
        Some("length") => debug!("{provider} output truncated at max_tokens"),
        _ => {}
    }

    choice
        .message
        .content
        .filter(|text| !text.trim().is_empty())
        .ok_or(LlmError::EmptyContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ChatResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_truncated_output_is_still_returned() {
        let response = parse(
            r#"{"choices":[{"message":{"content":"**Overall Match Score:** 82%"},"finish_reason":"length"}]}"#,
        );
        let text = extract_choice_text(LlmProvider::OpenAi, response).unwrap();
        assert_eq!(text, "**Overall Match Score:** 82%");
    }

    #[test]
    fn test_content_filter_maps_to_blocked() {
        let response = parse(
            r#"{"choices":[{"message":{"content":null},"finish_reason":"content_filter"}]}"#,
        );
        let err = extract_choice_text(LlmProvider::Groq, response).unwrap_err();
        assert!(matches!(err, LlmError::Blocked(_)));
    }

    #[test]
    fn test_no_choices_is_empty_content() {
        let response = parse(r#"{"choices":[],"usage":{"prompt_tokens":3,"completion_tokens":0}}"#);
        let err = extract_choice_text(LlmProvider::OpenAi, response).unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[test]
    fn test_groq_endpoint_uses_openai_path() {
        let client = OpenAiCompatibleClient::new(
            LlmProvider::Groq,
            Client::new(),
            GROQ_BASE_URL,
            "gsk".to_string(),
            "llama-3.3-70b-versatile".to_string(),
            3,
        );
        assert_eq!(
            client.endpoint,
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }
}
