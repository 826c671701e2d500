//! Job corpus storage and nearest-neighbour search.
//!
//! Callers depend on [`VectorIndex`] only. Two backends exist: an in-process
//! index with an optional JSON snapshot, and Qdrant. The backend is chosen once
//! at startup from [`VectorStoreSettings`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::VectorStoreSettings;
use crate::models::job::{JobFilter, JobPosting};

pub mod error;
pub mod memory;
pub mod qdrant;

pub use error::VectorStoreError;
pub use memory::MemoryJobIndex;
pub use qdrant::QdrantJobIndex;

/// A posting together with its embedding, as written to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedJob {
    pub posting: JobPosting,
    pub vector: Vec<f32>,
}

/// One nearest-neighbour result. `distance` is cosine distance (0.0 = identical).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub posting: JobPosting,
    pub distance: f32,
}

/// Storage for the jobs corpus.
///
/// `query` returns at most `k` hits ordered by ascending distance.
/// `upsert` replaces postings that share an id.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, jobs: Vec<IndexedJob>) -> Result<(), VectorStoreError>;

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&JobFilter>,
    ) -> Result<Vec<SearchHit>, VectorStoreError>;

    async fn count(&self) -> Result<usize, VectorStoreError>;

    async fn get(&self, id: &str) -> Result<Option<JobPosting>, VectorStoreError>;

    /// Removes one posting. Returns `false` when the id was not present.
    async fn delete(&self, id: &str) -> Result<bool, VectorStoreError>;

    async fn clear(&self) -> Result<(), VectorStoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    Memory,
    Qdrant,
}

impl FromStr for VectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(VectorBackend::Memory),
            "qdrant" => Ok(VectorBackend::Qdrant),
            other => Err(format!(
                "unknown vector backend '{other}'. Supported: memory, qdrant"
            )),
        }
    }
}

impl fmt::Display for VectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorBackend::Memory => write!(f, "memory"),
            VectorBackend::Qdrant => write!(f, "qdrant"),
        }
    }
}

/// Opens the configured backend.
pub async fn build_job_index(
    settings: &VectorStoreSettings,
    dimensions: usize,
) -> Result<Arc<dyn VectorIndex>, VectorStoreError> {
    let index: Arc<dyn VectorIndex> = match settings.backend {
        VectorBackend::Memory => {
            Arc::new(MemoryJobIndex::open(dimensions, settings.snapshot_path.clone())?)
        }
        VectorBackend::Qdrant => Arc::new(
            QdrantJobIndex::connect(&settings.qdrant_url, &settings.jobs_collection, dimensions)
                .await?,
        ),
    };

    info!(
        backend = %settings.backend,
        collection = %settings.jobs_collection,
        "Job index ready"
    );
    Ok(index)
}

/// Cosine similarity in [-1, 1]; 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_backend_parses_case_insensitively() {
        assert_eq!("Qdrant".parse::<VectorBackend>(), Ok(VectorBackend::Qdrant));
        assert_eq!("memory".parse::<VectorBackend>(), Ok(VectorBackend::Memory));
        assert!("chroma".parse::<VectorBackend>().is_err());
    }
}
