//! Text embedding seam.
//!
//! Retrieval and ingest depend on [`EmbeddingService`] only; the concrete backend
//! is chosen once at startup and carried as `Arc<dyn EmbeddingService>`.

use async_trait::async_trait;
use thiserror::Error;

pub mod openai;

#[cfg(test)]
pub mod mock;

pub use openai::OpenAiEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("cannot embed empty text")]
    EmptyInput,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding API returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
}

/// Converts text into fixed-length vectors.
///
/// Implementations must return vectors of exactly [`EmbeddingService::dimensions`]
/// entries and must reject empty input with [`EmbeddingError::EmptyInput`].
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds many texts in one call. Output order matches input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn dimensions(&self) -> usize;
}
