//! Deterministic embedders for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{EmbeddingError, EmbeddingService};

/// Returns the same vector for every input and counts calls.
pub struct FixedEmbedder {
    vector: Vec<f32>,
    calls: AtomicUsize,
    fail: bool,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// An embedder whose every call fails with an API error.
    pub fn failing(dimensions: usize) -> Self {
        Self {
            vector: vec![0.0; dimensions],
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingService for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        if self.fail {
            return Err(EmbeddingError::Api {
                status: 503,
                message: "embedding backend unavailable".to_string(),
            });
        }
        Ok(self.vector.clone())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.vector.len()
    }
}
