//! Axum route handlers for the Job Matching API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::{MatchingConfig, MAX_N_RESULTS};
use crate::errors::AppError;
use crate::matching::ranker::{JobAnalysis, MatchRequest};
use crate::matching::report::MatchReport;
use crate::models::job::JobFilter;
use crate::rag::retriever::{RerankedCandidate, RetrievalContext};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchJobsRequest {
    pub resume_text: String,
    pub n_results: Option<usize>,
    pub min_match_score: Option<f64>,
    #[serde(default)]
    pub filter: Option<JobFilter>,
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatchJobsResponse {
    pub report: MatchReport,
    pub markdown: String,
}

#[derive(Debug, Deserialize)]
pub struct TopMatchesRequest {
    pub resume_text: String,
    pub n_results: Option<usize>,
    #[serde(default)]
    pub boost_keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TopMatchesResponse {
    pub matches: Vec<RerankedCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct SearchJobsRequest {
    pub query: String,
    pub n_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct JobAnalysisRequest {
    pub resume_text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn require_resume(resume_text: &str) -> Result<(), AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }
    Ok(())
}

/// Resolves optional count/threshold overrides against the configured defaults.
pub(crate) fn resolve_match_params(
    n_results: Option<usize>,
    min_match_score: Option<f64>,
    config: &MatchingConfig,
) -> Result<(usize, f64), AppError> {
    let n_results = n_results.unwrap_or(config.default_n_results);
    if !(1..=MAX_N_RESULTS).contains(&n_results) {
        return Err(AppError::Validation(format!(
            "n_results must be between 1 and {MAX_N_RESULTS}"
        )));
    }

    let min_match_score = min_match_score.unwrap_or(config.min_match_score);
    if !(0.0..=1.0).contains(&min_match_score) {
        return Err(AppError::Validation(
            "min_match_score must be between 0.0 and 1.0".to_string(),
        ));
    }

    Ok((n_results, min_match_score))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/match
///
/// Runs the ranking pipeline and returns the structured report together with
/// its chat-ready Markdown rendering.
pub async fn handle_match_jobs(
    State(state): State<AppState>,
    Json(request): Json<MatchJobsRequest>,
) -> Result<Json<MatchJobsResponse>, AppError> {
    require_resume(&request.resume_text)?;
    let (n_results, min_match_score) = resolve_match_params(
        request.n_results,
        request.min_match_score,
        state.assistant.ranker.config(),
    )?;

    let match_request = MatchRequest {
        n_results,
        min_match_score,
        filter: request.filter.filter(|f| !f.is_empty()),
        user_query: request.query,
        ..MatchRequest::new(request.resume_text, state.assistant.ranker.config())
    };

    let report = state.assistant.ranker.find_matches(&match_request).await?;
    let markdown = report.render_markdown();

    Ok(Json(MatchJobsResponse { report, markdown }))
}

/// POST /api/v1/jobs/top-matches
///
/// Nearest jobs by embedding similarity only. No LLM calls.
pub async fn handle_top_matches(
    State(state): State<AppState>,
    Json(request): Json<TopMatchesRequest>,
) -> Result<Json<TopMatchesResponse>, AppError> {
    require_resume(&request.resume_text)?;
    let n_results = request.n_results.unwrap_or(state.config.top_k_retrieval);
    let (n_results, _) =
        resolve_match_params(Some(n_results), None, state.assistant.ranker.config())?;

    let matches = state
        .assistant
        .ranker
        .top_matches(&request.resume_text, n_results, &request.boost_keywords)
        .await?;

    Ok(Json(TopMatchesResponse { matches }))
}

/// POST /api/v1/jobs/search
///
/// Plain semantic search. No LLM call; returns the hits and the context block
/// the agents would see for the same query.
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    Json(request): Json<SearchJobsRequest>,
) -> Result<Json<RetrievalContext>, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }
    let n_results = request.n_results.unwrap_or(state.config.top_k_retrieval);
    let (n_results, _) =
        resolve_match_params(Some(n_results), None, state.assistant.ranker.config())?;

    let result = state
        .assistant
        .ranker
        .retriever()
        .retrieve_with_context(&request.query, n_results)
        .await?;

    Ok(Json(result))
}

/// POST /api/v1/jobs/:id/analysis
///
/// Detailed fit analysis of the resume against one stored job.
pub async fn handle_analyze_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<JobAnalysisRequest>,
) -> Result<Json<JobAnalysis>, AppError> {
    require_resume(&request.resume_text)?;

    let analysis = state
        .assistant
        .ranker
        .analyze_job(&request.resume_text, &job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    Ok(Json(analysis))
}
