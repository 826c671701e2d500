use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// GET /health
/// Returns service status, version and the current corpus size.
/// An unreachable index degrades the status instead of failing the probe.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let (status, total_jobs) = match state.ingestor.index().count().await {
        Ok(count) => ("ok", Some(count)),
        Err(e) => {
            warn!("Health check could not count jobs: {e}");
            ("degraded", None)
        }
    };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "service": "compass-api",
        "total_jobs": total_jobs
    }))
}
