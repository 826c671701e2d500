//! Axum route handlers for the Jobs corpus API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::ingest::{kaggle, IngestOptions, IngestSummary, RawJobListing, DEFAULT_BATCH_SIZE};
use crate::models::job::JobPosting;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

fn default_clean() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct IngestJobsRequest {
    pub jobs: Vec<RawJobListing>,
    #[serde(default = "default_clean")]
    pub clean: bool,
    #[serde(default)]
    pub clear_existing: bool,
    pub batch_size: Option<usize>,
}

/// Every field is optional; `{}` imports the whole export.
#[derive(Debug, Deserialize)]
pub struct ImportJobsRequest {
    pub max_jobs: Option<usize>,
    #[serde(default = "default_clean")]
    pub clean: bool,
    #[serde(default)]
    pub clear_existing: bool,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CorpusStats {
    pub total_jobs: usize,
    pub backend: String,
    pub collection: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearJobsResponse {
    pub removed: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs
///
/// Cleans, embeds and stores a batch of raw postings.
pub async fn handle_ingest_jobs(
    State(state): State<AppState>,
    Json(request): Json<IngestJobsRequest>,
) -> Result<Json<IngestSummary>, AppError> {
    if request.jobs.is_empty() && !request.clear_existing {
        return Err(AppError::Validation("jobs cannot be empty".to_string()));
    }

    let options = IngestOptions {
        clean: request.clean,
        clear_existing: request.clear_existing,
        batch_size: request.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
    };
    let summary = state.ingestor.ingest(request.jobs, &options).await?;

    Ok(Json(summary))
}

/// POST /api/v1/jobs/import
///
/// Loads the Kaggle postings export from `KAGGLE_DATA_DIR`, joining the
/// optional skills tables, then ingests it like `POST /api/v1/jobs`.
pub async fn handle_import_jobs(
    State(state): State<AppState>,
    Json(request): Json<ImportJobsRequest>,
) -> Result<Json<IngestSummary>, AppError> {
    if request.max_jobs == Some(0) {
        return Err(AppError::Validation("max_jobs must be at least 1".to_string()));
    }

    let dir = state.config.kaggle_data_dir.clone();
    let max_jobs = request.max_jobs;
    // CSV parsing is blocking file I/O.
    let listings = tokio::task::spawn_blocking(move || kaggle::load_dataset(&dir, max_jobs))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in job import: {e}"))
        })??;

    let options = IngestOptions {
        clean: request.clean,
        clear_existing: request.clear_existing,
        batch_size: request.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
    };
    let summary = state.ingestor.ingest(listings, &options).await?;
    info!(loaded = summary.loaded, "Kaggle export imported");

    Ok(Json(summary))
}

/// DELETE /api/v1/jobs
pub async fn handle_clear_jobs(
    State(state): State<AppState>,
) -> Result<Json<ClearJobsResponse>, AppError> {
    let index = state.ingestor.index();
    let removed = index.count().await?;
    index.clear().await?;
    info!(removed, "Job corpus cleared");

    Ok(Json(ClearJobsResponse { removed }))
}

/// GET /api/v1/jobs/stats
pub async fn handle_job_stats(
    State(state): State<AppState>,
) -> Result<Json<CorpusStats>, AppError> {
    let total_jobs = state.ingestor.index().count().await?;
    let settings = &state.config;

    Ok(Json(CorpusStats {
        total_jobs,
        backend: settings.vector_store.backend.to_string(),
        collection: settings.vector_store.jobs_collection.clone(),
        embedding_model: settings.embedding.model.clone(),
        embedding_dimensions: settings.embedding.dimensions,
    }))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobPosting>, AppError> {
    let job = state
        .ingestor
        .index()
        .get(&job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.ingestor.index().delete(&job_id).await? {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    info!(job_id = %job_id, "Job removed");

    Ok(StatusCode::NO_CONTENT)
}
