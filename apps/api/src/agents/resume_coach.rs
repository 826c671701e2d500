use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::agents::prompts::{DEFAULT_REVIEW_QUERY, RESUME_COACH_INSTRUCTION};
use crate::errors::AppError;
use crate::llm_client::prompts::{system_prompt, MARKDOWN_RESPONSE_INSTRUCTION};
use crate::llm_client::{CompletionRequest, CompletionService};
use crate::rag::context_builder::build_resume_feedback_context;
use crate::rag::retriever::Retriever;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRequest {
    pub resume_text: String,
    pub query: Option<String>,
    pub job_id: Option<String>,
    pub job_description: Option<String>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
}

/// Resume feedback, optionally targeted at a stored or pasted job description.
#[derive(Clone)]
pub struct ResumeCoach {
    retriever: Retriever,
    llm: Arc<dyn CompletionService>,
    system_prompt: String,
}

impl ResumeCoach {
    pub fn new(retriever: Retriever, llm: Arc<dyn CompletionService>) -> Self {
        Self {
            retriever,
            llm,
            system_prompt: system_prompt(&format!(
                "{RESUME_COACH_INSTRUCTION}\n\n{MARKDOWN_RESPONSE_INSTRUCTION}"
            )),
        }
    }

    pub async fn review(&self, request: &ReviewRequest) -> Result<String, AppError> {
        let mut job_description = request
            .job_description
            .clone()
            .filter(|d| !d.trim().is_empty());

        if job_description.is_none() {
            if let Some(job_id) = request.job_id.as_deref() {
                match self.retriever.get_job(job_id).await? {
                    Some(job) => {
                        debug!(job_id, "Loaded target job for resume review");
                        job_description = Some(job.text);
                    }
                    None => info!(job_id, "Target job not found; reviewing without it"),
                }
            }
        }

        let context = build_resume_feedback_context(
            &request.resume_text,
            job_description.as_deref(),
            &request.focus_areas,
        );
        let query = request
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(DEFAULT_REVIEW_QUERY);
        let prompt = format!("{context}\n\nUser Question: {query}");

        let feedback = self
            .llm
            .complete(&CompletionRequest {
                system: &self.system_prompt,
                prompt: &prompt,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            })
            .await?;
        Ok(feedback)
    }
}
