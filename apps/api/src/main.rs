mod agents;
mod config;
mod documents;
mod embedding;
mod errors;
mod ingest;
mod llm_client;
mod matching;
mod models;
mod rag;
mod routes;
mod state;
mod vector_store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::agents::{Assistant, InterviewCoach, ResumeCoach, Supervisor};
use crate::config::Config;
use crate::embedding::{EmbeddingService, OpenAiEmbedder};
use crate::ingest::JobIngestor;
use crate::llm_client::AgentLlms;
use crate::matching::JobMatchRanker;
use crate::rag::retriever::Retriever;
use crate::routes::build_router;
use crate::state::AppState;
use crate::vector_store::build_job_index;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; fails on missing keys for any selected provider
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Compass API v{}", env!("CARGO_PKG_VERSION"));

    // Embeddings
    let embedder: Arc<dyn EmbeddingService> = Arc::new(
        OpenAiEmbedder::new(&config.embedding).context("failed to build embedding client")?,
    );
    info!(
        "Embedding client initialized (model: {}, dimensions: {})",
        config.embedding.model, config.embedding.dimensions
    );

    // Job index
    let index = build_job_index(&config.vector_store, embedder.dimensions())
        .await
        .context("failed to open job index")?;
    info!("Job index holds {} postings", index.count().await?);

    // One completion client per agent
    let llms = AgentLlms::from_settings(&config.llm).context("failed to build LLM clients")?;
    info!(
        "LLM clients initialized (supervisor: {}, job matcher: {}, resume coach: {}, interview prep: {})",
        llms.supervisor.provider(),
        llms.job_matcher.provider(),
        llms.resume_coach.provider(),
        llms.interview_prep.provider()
    );

    let retriever = Retriever::new(index.clone(), embedder.clone());
    let assistant = Assistant {
        supervisor: Supervisor::new(llms.supervisor),
        ranker: JobMatchRanker::new(retriever.clone(), llms.job_matcher, config.matching.clone()),
        resume_coach: ResumeCoach::new(retriever.clone(), llms.resume_coach),
        interview_coach: InterviewCoach::new(retriever, llms.interview_prep),
    };

    // Build app state
    let state = AppState {
        config: config.clone(),
        assistant,
        ingestor: JobIngestor::new(index, embedder),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
