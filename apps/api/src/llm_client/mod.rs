/// LLM Client: the single point of entry for every completion call.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// Agents and the ranker depend on [`CompletionService`]; the concrete backend is
/// picked per agent at startup by [`build_completion_service`].
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use thiserror::Error;
use tracing::warn;

use crate::config::LlmSettings;

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod prompts;

#[cfg(test)]
pub mod mock;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiCompatibleClient;

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Response blocked by provider: {0}")]
    Blocked(String),

    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("No API key configured for {0}")]
    MissingApiKey(LlmProvider),
}

// ────────────────────────────────────────────────────────────────────────────
// Provider selection
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenAi,
    Groq,
    Gemini,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            "openai" => Ok(LlmProvider::OpenAi),
            "groq" => Ok(LlmProvider::Groq),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            other => Err(format!(
                "unknown LLM provider '{other}'. Supported: anthropic, openai, groq, gemini"
            )),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Groq => "groq",
            LlmProvider::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Completion seam
// ────────────────────────────────────────────────────────────────────────────

/// One single-turn completion: system instruction plus user prompt.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text completion backend. Output is nondeterministic free text.
///
/// Output cut short by the token limit is returned as-is; provider refusals and
/// safety blocks surface as [`LlmError::Blocked`].
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError>;

    fn provider(&self) -> LlmProvider;

    fn model(&self) -> &str;
}

/// Completion backends assigned to each agent.
#[derive(Clone)]
pub struct AgentLlms {
    pub supervisor: Arc<dyn CompletionService>,
    pub job_matcher: Arc<dyn CompletionService>,
    pub resume_coach: Arc<dyn CompletionService>,
    pub interview_prep: Arc<dyn CompletionService>,
}

impl AgentLlms {
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        Ok(Self {
            supervisor: build_completion_service(settings, settings.supervisor)?,
            job_matcher: build_completion_service(settings, settings.job_matcher)?,
            resume_coach: build_completion_service(settings, settings.resume_coach)?,
            interview_prep: build_completion_service(settings, settings.interview_prep)?,
        })
    }
}

/// Builds the client for `provider` using the credentials and model in `settings`.
pub fn build_completion_service(
    settings: &LlmSettings,
    provider: LlmProvider,
) -> Result<Arc<dyn CompletionService>, LlmError> {
    let api_key = settings
        .api_key(provider)
        .ok_or(LlmError::MissingApiKey(provider))?
        .to_string();
    let model = settings.model(provider).to_string();
    let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let max_attempts = settings.max_attempts;

    let service: Arc<dyn CompletionService> = match provider {
        LlmProvider::Anthropic => Arc::new(AnthropicClient::new(http, api_key, model, max_attempts)),
        LlmProvider::OpenAi => Arc::new(OpenAiCompatibleClient::new(
            LlmProvider::OpenAi,
            http,
            &settings.openai_base_url,
            api_key,
            model,
            max_attempts,
        )),
        LlmProvider::Groq => Arc::new(OpenAiCompatibleClient::new(
            LlmProvider::Groq,
            http,
            openai::GROQ_BASE_URL,
            api_key,
            model,
            max_attempts,
        )),
        LlmProvider::Gemini => Arc::new(GeminiClient::new(http, api_key, model, max_attempts)),
    };
    Ok(service)
}

// ────────────────────────────────────────────────────────────────────────────
// Shared transport
// ────────────────────────────────────────────────────────────────────────────

/// Sends a request, retrying on 429 (rate limit) and 5xx with exponential backoff.
///
/// `build` is called once per attempt. Non-retryable failures return immediately
/// with the message `error_message` extracts from the body, or the raw body.
pub(crate) async fn send_with_retry(
    provider: LlmProvider,
    max_attempts: u32,
    build: impl Fn() -> RequestBuilder,
    error_message: fn(&str) -> Option<String>,
) -> Result<Response, LlmError> {
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..max_attempts {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
            warn!(
                "{provider} call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(LlmError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("{provider} API returned {}: {}", status, body);
            last_error = Some(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        return Ok(response);
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        retries: max_attempts,
    }))
}
