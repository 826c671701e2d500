//! JobMatchRanker: resume to threshold-filtered job matches.
//!
//! Pipeline: summarise resume → retrieve a tiered candidate pool → drop
//! candidates below the similarity floor → score candidates one at a time with
//! the LLM, stopping as soon as `n_results` have cleared the threshold.
//!
//! Results keep discovery order. The goal is the first N good-enough matches
//! found with the fewest LLM calls, not the N best matches in the pool.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MatchingConfig;
use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{CompletionRequest, CompletionService, LlmError};
use crate::matching::prompts::{ANALYZE_JOB_QUESTION, JOB_MATCHER_INSTRUCTION, SCORE_INSTRUCTION};
use crate::matching::report::{MatchReport, MatchResult, MatchStats, MatchStatus};
use crate::matching::score_extractor::{extract_candidate_score, extract_score, renumber_job_heading};
use crate::matching::summarizer::extract_search_query;
use crate::models::job::{JobFilter, JobPosting};
use crate::rag::context_builder::build_job_matching_context;
use crate::rag::retriever::{
    rerank_results, RerankedCandidate, RetrievalError, RetrievedCandidate, Retriever,
};

/// Output budget for the single-job deep dive.
const ANALYSIS_MAX_TOKENS: u32 = 1500;

/// Parameters for one ranking pass.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub resume_text: String,
    pub n_results: usize,
    pub min_match_score: f64,
    pub filter: Option<JobFilter>,
    /// Optional user question forwarded into each scoring prompt.
    pub user_query: Option<String>,
}

impl MatchRequest {
    /// A request using the configured defaults for count and threshold.
    pub fn new(resume_text: impl Into<String>, config: &MatchingConfig) -> Self {
        Self {
            resume_text: resume_text.into(),
            n_results: config.default_n_results,
            min_match_score: config.min_match_score,
            filter: None,
            user_query: None,
        }
    }
}

/// Detailed analysis of one specific job.
#[derive(Debug, Clone, Serialize)]
pub struct JobAnalysis {
    pub job: JobPosting,
    pub score: Option<f64>,
    pub analysis: String,
}

/// Keeps candidates whose similarity is at least `min_similarity`, in order.
pub fn pre_filter(candidates: Vec<RetrievedCandidate>, min_similarity: f64) -> Vec<RetrievedCandidate> {
    candidates
        .into_iter()
        .filter(|c| c.similarity_score >= min_similarity)
        .collect()
}

#[derive(Clone)]
pub struct JobMatchRanker {
    retriever: Retriever,
    llm: Arc<dyn CompletionService>,
    config: MatchingConfig,
    system_prompt: String,
}

impl JobMatchRanker {
    pub fn new(retriever: Retriever, llm: Arc<dyn CompletionService>, config: MatchingConfig) -> Self {
        Self {
            retriever,
            llm,
            config,
            system_prompt: system_prompt(JOB_MATCHER_INSTRUCTION),
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Runs the full ranking pipeline for `request`.
    ///
    /// Only corpus-level failures (counting, embedding, searching) are errors.
    /// A failed or timed-out completion for one candidate is logged, counted in
    /// [`MatchStats::scoring_failures`] and skipped.
    pub async fn find_matches(&self, request: &MatchRequest) -> Result<MatchReport, RetrievalError> {
        let mut stats = MatchStats {
            total_jobs: self.retriever.total_jobs().await?,
            ..MatchStats::default()
        };

        let report = |status, query: String, matches, stats| {
            MatchReport::new(
                status,
                query,
                request.n_results,
                request.min_match_score,
                matches,
                stats,
            )
        };

        if stats.total_jobs == 0 {
            info!("Job corpus is empty; skipping retrieval");
            return Ok(report(MatchStatus::CorpusEmpty, String::new(), Vec::new(), stats));
        }

        let search_query = extract_search_query(&request.resume_text);
        stats.pool_size = self.config.pool_size(stats.total_jobs);
        info!(
            total_jobs = stats.total_jobs,
            pool_size = stats.pool_size,
            n_results = request.n_results,
            min_match_score = request.min_match_score,
            "Searching job corpus for matches"
        );
        debug!(query = %search_query, "Derived resume search query");

        let candidates = self
            .retriever
            .retrieve_jobs(&search_query, stats.pool_size, request.filter.as_ref())
            .await?;
        stats.retrieved = candidates.len();

        if candidates.is_empty() {
            return Ok(report(MatchStatus::NoCandidates, search_query, Vec::new(), stats));
        }

        let pool = pre_filter(candidates, self.config.min_semantic_similarity);
        stats.pre_filtered = pool.len();
        if stats.pre_filtered < stats.retrieved {
            info!(
                kept = stats.pre_filtered,
                retrieved = stats.retrieved,
                floor = self.config.min_semantic_similarity,
                "Pre-filtered candidates by semantic similarity"
            );
        }

        let mut accepted: Vec<(f64, RetrievedCandidate, String)> = Vec::new();

        for candidate in pool {
            if accepted.len() >= request.n_results {
                break;
            }
            stats.checked += 1;
            debug!(
                job_id = %candidate.job.id,
                title = %candidate.job.metadata.title,
                found = accepted.len(),
                "Scoring candidate"
            );

            let response = match self.score_candidate(request, &candidate).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(job_id = %candidate.job.id, "Scoring failed, skipping candidate: {e}");
                    stats.scoring_failures += 1;
                    continue;
                }
            };

            let (score, explanation) = extract_candidate_score(&response);
            let score = score.unwrap_or_else(|| {
                debug!(job_id = %candidate.job.id, "No match score in response; treating as 0");
                stats.unparseable_scores += 1;
                0.0
            });

            if score >= request.min_match_score {
                info!(
                    job_id = %candidate.job.id,
                    score,
                    position = accepted.len() + 1,
                    "Candidate accepted"
                );
                accepted.push((score, candidate, explanation.to_string()));
                if accepted.len() >= request.n_results {
                    info!(found = accepted.len(), "Enough matches found, stopping search");
                    break;
                }
            } else {
                debug!(job_id = %candidate.job.id, score, "Candidate below threshold");
            }
        }

        let matches: Vec<MatchResult> = accepted
            .into_iter()
            .enumerate()
            .map(|(i, (score, candidate, explanation))| {
                let rank = i + 1;
                MatchResult {
                    rank,
                    score: score.clamp(0.0, 1.0),
                    similarity_score: candidate.similarity_score,
                    explanation: with_rank_heading(&explanation, rank, &candidate.job),
                    job: candidate.job,
                }
            })
            .collect();

        info!(
            found = matches.len(),
            checked = stats.checked,
            failures = stats.scoring_failures,
            "Job matching finished"
        );

        let status = if matches.is_empty() {
            MatchStatus::NoMatchesAboveThreshold
        } else {
            MatchStatus::Matched
        };
        Ok(report(status, search_query, matches, stats))
    }

    /// One bounded completion for one candidate, cut off at the configured timeout.
    async fn score_candidate(
        &self,
        request: &MatchRequest,
        candidate: &RetrievedCandidate,
    ) -> Result<String, LlmError> {
        let mut prompt = build_job_matching_context(
            &request.resume_text,
            std::slice::from_ref(candidate),
            request.user_query.as_deref(),
            self.config.job_text_char_limit,
        );
        prompt.push_str(SCORE_INSTRUCTION);

        let completion = CompletionRequest {
            system: &self.system_prompt,
            prompt: &prompt,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tokio::time::timeout(self.config.completion_timeout, self.llm.complete(&completion))
            .await
            .map_err(|_| LlmError::Timeout(self.config.completion_timeout))?
    }

    /// Nearest jobs for a resume without any LLM scoring, optionally boosted by keywords.
    pub async fn top_matches(
        &self,
        resume_text: &str,
        n_results: usize,
        boost_keywords: &[String],
    ) -> Result<Vec<RerankedCandidate>, RetrievalError> {
        let query = extract_search_query(resume_text);
        let candidates = self.retriever.retrieve_jobs(&query, n_results, None).await?;
        Ok(rerank_results(candidates, boost_keywords))
    }

    /// Detailed fit analysis for one job. `Ok(None)` when the id is unknown.
    pub async fn analyze_job(
        &self,
        resume_text: &str,
        job_id: &str,
    ) -> Result<Option<JobAnalysis>, AppError> {
        let Some(job) = self.retriever.get_job(job_id).await? else {
            return Ok(None);
        };

        let candidate = RetrievedCandidate {
            job,
            similarity_score: 1.0,
            rank: 1,
        };
        let title = if candidate.job.metadata.title.is_empty() {
            "this"
        } else {
            candidate.job.metadata.title.as_str()
        };
        let question = ANALYZE_JOB_QUESTION.replace("{title}", title);
        let prompt = build_job_matching_context(
            resume_text,
            std::slice::from_ref(&candidate),
            Some(&question),
            self.config.job_text_char_limit,
        );

        let analysis = self
            .llm
            .complete(&CompletionRequest {
                system: &self.system_prompt,
                prompt: &prompt,
                temperature: self.config.temperature,
                max_tokens: ANALYSIS_MAX_TOKENS,
            })
            .await?;

        Ok(Some(JobAnalysis {
            score: extract_score(&analysis),
            job: candidate.job,
            analysis,
        }))
    }
}

/// Renumbers the explanation's job heading, or adds one when the model omitted it.
fn with_rank_heading(explanation: &str, rank: usize, job: &JobPosting) -> String {
    renumber_job_heading(explanation, rank).unwrap_or_else(|| {
        format!(
            "### Job #{rank}: {} at {}\n\n{}",
            job.metadata.title,
            job.metadata.company_or_unknown(),
            explanation.trim()
        )
    })
}
