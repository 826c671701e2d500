use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{cosine_similarity, IndexedJob, SearchHit, VectorIndex, VectorStoreError};
use crate::models::job::{JobFilter, JobPosting};

/// In-process job index with exact cosine search.
///
/// When a snapshot path is configured every mutation rewrites the snapshot
/// through a temp file in the same directory, so a crash never leaves a
/// half-written file behind.
pub struct MemoryJobIndex {
    dimensions: usize,
    jobs: RwLock<BTreeMap<String, IndexedJob>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryJobIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            jobs: RwLock::new(BTreeMap::new()),
            snapshot_path: None,
        }
    }

    /// Opens an index, loading the snapshot at `snapshot_path` if it exists.
    pub fn open(
        dimensions: usize,
        snapshot_path: Option<PathBuf>,
    ) -> Result<Self, VectorStoreError> {
        let mut jobs = BTreeMap::new();

        if let Some(path) = snapshot_path.as_deref().filter(|p| p.exists()) {
            let raw = std::fs::read(path).map_err(|e| snapshot_error(path, e))?;
            let stored: Vec<IndexedJob> =
                serde_json::from_slice(&raw).map_err(|e| snapshot_error(path, e))?;
            for job in stored {
                check_dimension(dimensions, &job.vector)?;
                jobs.insert(job.posting.id.clone(), job);
            }
            info!(path = %path.display(), jobs = jobs.len(), "Loaded job index snapshot");
        }

        Ok(Self {
            dimensions,
            jobs: RwLock::new(jobs),
            snapshot_path,
        })
    }

    fn write_snapshot(&self, jobs: &BTreeMap<String, IndexedJob>) -> Result<(), VectorStoreError> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| snapshot_error(path, e))?;

        let stored: Vec<&IndexedJob> = jobs.values().collect();
        let bytes = serde_json::to_vec(&stored).map_err(|e| snapshot_error(path, e))?;

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| snapshot_error(path, e))?;
        temp.write_all(&bytes).map_err(|e| snapshot_error(path, e))?;
        temp.as_file().sync_all().map_err(|e| snapshot_error(path, e))?;
        temp.persist(path).map_err(|e| snapshot_error(path, e.error))?;

        debug!(path = %path.display(), jobs = stored.len(), "Wrote job index snapshot");
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for MemoryJobIndex {
    async fn upsert(&self, jobs: Vec<IndexedJob>) -> Result<(), VectorStoreError> {
        for job in &jobs {
            check_dimension(self.dimensions, &job.vector)?;
        }

        let mut guard = self.jobs.write().await;
        for job in jobs {
            guard.insert(job.posting.id.clone(), job);
        }
        self.write_snapshot(&guard)
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&JobFilter>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        check_dimension(self.dimensions, vector)?;

        let guard = self.jobs.read().await;
        let mut hits: Vec<SearchHit> = guard
            .values()
            .filter(|job| filter.map_or(true, |f| f.matches(&job.posting.metadata)))
            .map(|job| SearchHit {
                posting: job.posting.clone(),
                distance: 1.0 - cosine_similarity(vector, &job.vector),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize, VectorStoreError> {
        Ok(self.jobs.read().await.len())
    }

    async fn get(&self, id: &str) -> Result<Option<JobPosting>, VectorStoreError> {
        Ok(self.jobs.read().await.get(id).map(|job| job.posting.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, VectorStoreError> {
        let mut guard = self.jobs.write().await;
        let removed = guard.remove(id).is_some();
        if removed {
            self.write_snapshot(&guard)?;
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), VectorStoreError> {
        let mut guard = self.jobs.write().await;
        guard.clear();
        self.write_snapshot(&guard)
    }
}

fn check_dimension(expected: usize, vector: &[f32]) -> Result<(), VectorStoreError> {
    if vector.len() != expected {
        return Err(VectorStoreError::InvalidDimension {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

fn snapshot_error(path: &Path, err: impl std::fmt::Display) -> VectorStoreError {
    VectorStoreError::Snapshot {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
