use crate::agents::Assistant;
use crate::config::Config;
use crate::ingest::JobIngestor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Supervisor plus the specialist agents, including the job match ranker.
    pub assistant: Assistant,
    /// Write access to the job index. Reads for lookups and stats go through it too.
    pub ingestor: JobIngestor,
}
