use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::agents::prompts::{
    DEFAULT_INTERVIEW_QUERY, GENERAL_INTERVIEW_PREP_PROMPT, INTERVIEW_PREP_INSTRUCTION,
};
use crate::errors::AppError;
use crate::llm_client::prompts::{system_prompt, MARKDOWN_RESPONSE_INSTRUCTION};
use crate::llm_client::{CompletionRequest, CompletionService};
use crate::rag::context_builder::{build_interview_context, truncate_context};
use crate::rag::retriever::Retriever;

const TEMPERATURE: f32 = 0.8;
const MAX_TOKENS: u32 = 8192;
/// Input budget in tokens (about 50 000 characters).
const MAX_CONTEXT_TOKENS: usize = 12_500;
/// Resume budget for the resume-only prompt.
const MAX_RESUME_TOKENS: usize = 10_000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterviewPrepRequest {
    pub resume_text: String,
    pub query: Option<String>,
    pub job_id: Option<String>,
    pub job_description: Option<String>,
    pub company_info: Option<String>,
}

#[derive(Clone)]
pub struct InterviewCoach {
    retriever: Retriever,
    llm: Arc<dyn CompletionService>,
    system_prompt: String,
}

impl InterviewCoach {
    pub fn new(retriever: Retriever, llm: Arc<dyn CompletionService>) -> Self {
        Self {
            retriever,
            llm,
            system_prompt: system_prompt(&format!(
                "{INTERVIEW_PREP_INSTRUCTION}\n\n{MARKDOWN_RESPONSE_INSTRUCTION}"
            )),
        }
    }

    /// Interview preparation for a job, or resume-only preparation when no
    /// job is given. An unknown `job_id` is a `NotFound` error.
    pub async fn prepare(&self, request: &InterviewPrepRequest) -> Result<String, AppError> {
        let query = request
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(DEFAULT_INTERVIEW_QUERY);

        let pasted = request
            .job_description
            .as_deref()
            .filter(|d| !d.trim().is_empty());
        let mut company_info = request
            .company_info
            .clone()
            .filter(|c| !c.trim().is_empty());

        let job_description = match (pasted, request.job_id.as_deref()) {
            (Some(description), _) => description.to_string(),
            (None, Some(job_id)) => {
                let job = self
                    .retriever
                    .get_job(job_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
                if company_info.is_none() && !job.metadata.company.trim().is_empty() {
                    company_info = Some(format!("Company: {}", job.metadata.company));
                }
                job.text
            }
            (None, None) => {
                debug!("No target job; preparing from resume only");
                return self.complete(&general_prep_prompt(&request.resume_text, query)).await;
            }
        };

        let context =
            build_interview_context(&request.resume_text, &job_description, company_info.as_deref());
        let capped = truncate_context(&context, MAX_CONTEXT_TOKENS);
        if capped.len() < context.len() {
            warn!(chars = context.chars().count(), "Interview context truncated");
        }

        self.complete(&format!("{capped}\n\nUser Request: {query}")).await
    }

    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        debug!(chars = prompt.chars().count(), "Requesting interview preparation");
        let answer = self
            .llm
            .complete(&CompletionRequest {
                system: &self.system_prompt,
                prompt,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            })
            .await?;
        Ok(answer)
    }
}

fn general_prep_prompt(resume_text: &str, query: &str) -> String {
    let resume = truncate_context(resume_text, MAX_RESUME_TOKENS);
    GENERAL_INTERVIEW_PREP_PROMPT
        .replace("{resume}", &resume)
        .replace("{query}", query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::ScriptedCompletion;
    use crate::rag::retriever::test_support::retriever_with_similarities;

    async fn coach() -> (InterviewCoach, Arc<ScriptedCompletion>) {
        let (retriever, _) = retriever_with_similarities(&[0.9]).await;
        let llm = Arc::new(ScriptedCompletion::always("Q1: Tell me about yourself."));
        (InterviewCoach::new(retriever, llm.clone()), llm)
    }

    #[tokio::test]
    async fn test_without_job_uses_resume_only_prompt() {
        let (coach, llm) = coach().await;
        coach
            .prepare(&InterviewPrepRequest {
                resume_text: "Jane Doe, Rust engineer".to_string(),
                ..InterviewPrepRequest::default()
            })
            .await
            .unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("based ONLY on the candidate's resume"));
        assert!(prompt.contains("Jane Doe, Rust engineer"));
        assert!(prompt.contains(DEFAULT_INTERVIEW_QUERY));
        assert!(!prompt.contains("=== TARGET JOB ==="));
    }

    #[tokio::test]
    async fn test_job_id_resolves_company_from_metadata() {
        let (coach, llm) = coach().await;
        coach
            .prepare(&InterviewPrepRequest {
                resume_text: "Jane Doe".to_string(),
                job_id: Some("job_1".to_string()),
                query: Some("What will they ask about Rust?".to_string()),
                ..InterviewPrepRequest::default()
            })
            .await
            .unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("=== TARGET JOB ===\nJob Title: Engineer 1"));
        assert!(prompt.contains("=== COMPANY INFORMATION ===\nCompany: Acme"));
        assert!(prompt.ends_with("User Request: What will they ask about Rust?"));
    }

    #[tokio::test]
    async fn test_unknown_job_id_is_not_found() {
        let (coach, llm) = coach().await;
        let err = coach
            .prepare(&InterviewPrepRequest {
                resume_text: "Jane Doe".to_string(),
                job_id: Some("job_404".to_string()),
                ..InterviewPrepRequest::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_oversized_context_is_truncated() {
        let (coach, llm) = coach().await;
        coach
            .prepare(&InterviewPrepRequest {
                resume_text: "r".repeat(60_000),
                job_description: Some("Backend role".to_string()),
                ..InterviewPrepRequest::default()
            })
            .await
            .unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("[... Context truncated due to length ...]"));
        assert!(prompt.chars().count() < 51_000);
    }
}
