//! Semantic retrieval over the jobs corpus.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::embedding::{EmbeddingError, EmbeddingService};
use crate::models::job::{JobFilter, JobPosting};
use crate::vector_store::{VectorIndex, VectorStoreError};

/// Boost added per matched keyword by [`rerank_results`].
const KEYWORD_BOOST: f64 = 0.1;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("search query is empty")]
    EmptyQuery,

    #[error("failed to embed search query: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("job index unavailable: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// A job returned by one retrieval, with its position in that result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedCandidate {
    pub job: JobPosting,
    /// `1 - cosine_distance`, clamped to [0, 1].
    pub similarity_score: f64,
    /// 1-based; similarity is non-increasing in rank.
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RerankedCandidate {
    #[serde(flatten)]
    pub candidate: RetrievedCandidate,
    pub boosted_score: f64,
}

/// Candidates plus a prompt-ready context block describing them.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalContext {
    pub candidates: Vec<RetrievedCandidate>,
    pub context: String,
}

#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingService>,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn EmbeddingService>) -> Self {
        Self { index, embedder }
    }

    /// Embeds `query` and returns up to `n_results` nearest jobs in ascending
    /// distance order. Embedding failures are not retried.
    pub async fn retrieve_jobs(
        &self,
        query: &str,
        n_results: usize,
        filter: Option<&JobFilter>,
    ) -> Result<Vec<RetrievedCandidate>, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(query).await?;
        let hits = self.index.query(&vector, n_results, filter).await?;

        let candidates: Vec<RetrievedCandidate> = hits
            .into_iter()
            .enumerate()
            .map(|(i, hit)| RetrievedCandidate {
                job: hit.posting,
                similarity_score: (1.0 - f64::from(hit.distance)).clamp(0.0, 1.0),
                rank: i + 1,
            })
            .collect();

        debug!(
            requested = n_results,
            returned = candidates.len(),
            "Retrieved job candidates"
        );
        Ok(candidates)
    }

    pub async fn total_jobs(&self) -> Result<usize, RetrievalError> {
        Ok(self.index.count().await?)
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Option<JobPosting>, RetrievalError> {
        Ok(self.index.get(job_id).await?)
    }

    pub async fn retrieve_with_context(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<RetrievalContext, RetrievalError> {
        let candidates = self.retrieve_jobs(query, n_results, None).await?;
        let context = format_documents(&candidates);
        Ok(RetrievalContext {
            candidates,
            context,
        })
    }
}

fn format_documents(candidates: &[RetrievedCandidate]) -> String {
    candidates
        .iter()
        .map(|c| {
            let meta = &c.job.metadata;
            format!(
                "[Document {}]\nMetadata: title={}, company={}, location={}\nContent: {}\nSimilarity: {:.3}\n",
                c.rank,
                meta.title,
                meta.company_or_unknown(),
                meta.location,
                c.job.text,
                c.similarity_score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Boosts candidates whose text mentions `boost_keywords` and re-sorts them.
///
/// Each keyword found (case-insensitive) adds 0.1 to the similarity. Ties keep
/// their retrieval order; ranks are reassigned from 1.
pub fn rerank_results(
    candidates: Vec<RetrievedCandidate>,
    boost_keywords: &[String],
) -> Vec<RerankedCandidate> {
    let keywords: Vec<String> = boost_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    let mut reranked: Vec<RerankedCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let text = candidate.job.text.to_lowercase();
            let hits = keywords.iter().filter(|k| text.contains(k.as_str())).count();
            RerankedCandidate {
                boosted_score: candidate.similarity_score + KEYWORD_BOOST * hits as f64,
                candidate,
            }
        })
        .collect();

    reranked.sort_by(|a, b| b.boosted_score.total_cmp(&a.boosted_score));
    for (i, r) in reranked.iter_mut().enumerate() {
        r.candidate.rank = i + 1;
    }
    reranked
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::embedding::mock::FixedEmbedder;
    use crate::models::job::sample_job;
    use crate::vector_store::MemoryJobIndex;

    #[tokio::test]
    async fn test_candidates_ranked_by_similarity() {
        let (retriever, embedder) = retriever_with_similarities(&[0.5, 0.9, 0.7]).await;

        let candidates = retriever.retrieve_jobs("rust engineer", 3, None).await.unwrap();
        let ids: Vec<_> = candidates.iter().map(|c| c.job.id.as_str()).collect();
        assert_eq!(ids, vec!["job_2", "job_3", "job_1"]);
        assert_eq!(
            candidates.iter().map(|c| c.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!((candidates[0].similarity_score - 0.9).abs() < 1e-4);
        assert!(candidates
            .windows(2)
            .all(|w| w[0].similarity_score >= w[1].similarity_score));
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_rejected_without_embedding() {
        let (retriever, embedder) = retriever_with_similarities(&[0.5]).await;
        let err = retriever.retrieve_jobs("  ", 5, None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmptyQuery));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let index = Arc::new(MemoryJobIndex::new(2));
        let retriever = Retriever::new(index, Arc::new(FixedEmbedder::failing(2)));
        let err = retriever.retrieve_jobs("data", 5, None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_surfaces_as_vector_store_error() {
        let index = Arc::new(MemoryJobIndex::new(3));
        let retriever = Retriever::new(index, Arc::new(FixedEmbedder::new(vec![1.0, 0.0])));
        let err = retriever.retrieve_jobs("data", 5, None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::VectorStore(_)));
    }

    #[tokio::test]
    async fn test_context_lists_each_document() {
        let (retriever, _) = retriever_with_similarities(&[0.8, 0.6]).await;
        let result = retriever.retrieve_with_context("backend", 2).await.unwrap();
        assert_eq!(result.candidates.len(), 2);
        assert!(result.context.contains("[Document 1]"));
        assert!(result.context.contains("[Document 2]"));
        assert!(result.context.contains("Similarity: 0.800"));
    }

    #[test]
    fn test_rerank_boosts_keyword_matches() {
        let mut rust_job = sample_job("job_rust", "Engineer");
        rust_job.text.push_str(" Rust and Kubernetes required.");
        let candidates = vec![
            RetrievedCandidate {
                job: sample_job("job_plain", "Engineer"),
                similarity_score: 0.8,
                rank: 1,
            },
            RetrievedCandidate {
                job: rust_job,
                similarity_score: 0.7,
                rank: 2,
            },
        ];

        let reranked = rerank_results(candidates, &["rust".to_string(), "kubernetes".to_string()]);
        assert_eq!(reranked[0].candidate.job.id, "job_rust");
        assert_eq!(reranked[0].candidate.rank, 1);
        assert!((reranked[0].boosted_score - 0.9).abs() < 1e-9);
        assert_eq!(reranked[1].candidate.rank, 2);
    }
}
