//! Axum route handlers for the chat and coaching APIs.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::agents::{AgentKind, ChatRequest, ChatResponse, InterviewPrepRequest, ReviewRequest};
use crate::errors::AppError;
use crate::matching::handlers::{require_resume, resolve_match_params};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AgentReply {
    pub agent: AgentKind,
    pub response: String,
}

/// POST /api/v1/chat
///
/// Routes a free-form message through the supervisor to one agent.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }
    let (n_results, min_match_score) = resolve_match_params(
        request.n_results,
        request.min_match_score,
        state.assistant.ranker.config(),
    )?;

    let response = state.assistant.chat(request, n_results, min_match_score).await?;
    Ok(Json(response))
}

/// POST /api/v1/resumes/review
pub async fn handle_review_resume(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<AgentReply>, AppError> {
    require_resume(&request.resume_text)?;

    let response = state.assistant.resume_coach.review(&request).await?;
    Ok(Json(AgentReply {
        agent: AgentKind::ResumeCoach,
        response,
    }))
}

/// POST /api/v1/interviews/prep
///
/// Without a job this produces resume-only preparation.
pub async fn handle_interview_prep(
    State(state): State<AppState>,
    Json(request): Json<InterviewPrepRequest>,
) -> Result<Json<AgentReply>, AppError> {
    require_resume(&request.resume_text)?;

    let response = state.assistant.interview_coach.prepare(&request).await?;
    Ok(Json(AgentReply {
        agent: AgentKind::InterviewPrep,
        response,
    }))
}
