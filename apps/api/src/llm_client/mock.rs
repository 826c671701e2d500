//! Scripted completion backend for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{CompletionRequest, CompletionService, LlmError, LlmProvider};

type Responder = Box<dyn Fn(usize, &str) -> Result<String, LlmError> + Send + Sync>;

/// Answers each call through a responder closure and records every prompt.
pub struct ScriptedCompletion {
    responder: Responder,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedCompletion {
    /// Responds by call index (0-based) and prompt text.
    pub fn from_fn(
        responder: impl Fn(usize, &str) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Replays `responses` in order. `Err` entries become API errors; calls past
    /// the end return [`LlmError::EmptyContent`].
    pub fn queue(responses: Vec<Result<&str, &str>>) -> Self {
        let responses: Vec<Result<String, String>> = responses
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Self::from_fn(move |call, _| match responses.get(call) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(LlmError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Err(LlmError::EmptyContent),
        })
    }

    /// Always returns `text`.
    pub fn always(text: &str) -> Self {
        let text = text.to_string();
        Self::from_fn(move |_, _| Ok(text.clone()))
    }

    /// Sleeps before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(call, request.prompt)
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAi
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
