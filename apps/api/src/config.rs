use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::LlmProvider;
use crate::vector_store::VectorBackend;

/// Upper bound on `n_results` for one ranking pass.
pub const MAX_N_RESULTS: usize = 20;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub max_upload_mb: usize,
    /// Number of jobs pulled into chat and coaching contexts.
    pub top_k_retrieval: usize,
    /// Directory holding the Kaggle postings export read by the import endpoint.
    pub kaggle_data_dir: PathBuf,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub matching: MatchingConfig,
}

/// Provider selection, credentials and model names for every completion backend.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub primary: LlmProvider,
    pub supervisor: LlmProvider,
    pub job_matcher: LlmProvider,
    pub resume_coach: LlmProvider,
    pub interview_prep: LlmProvider,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub anthropic_model: String,
    pub openai_model: String,
    pub groq_model: String,
    pub gemini_model: String,
    pub openai_base_url: String,
    /// Attempts per HTTP call when the provider answers 429 or 5xx. 1 disables retries.
    pub max_attempts: u32,
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct VectorStoreSettings {
    pub backend: VectorBackend,
    pub qdrant_url: String,
    pub jobs_collection: String,
    /// JSON snapshot for the in-memory backend. `None` keeps the corpus in memory only.
    pub snapshot_path: Option<PathBuf>,
}

/// Tunables for the job-matching ranking pipeline.
///
/// Passed by value into [`crate::matching::ranker::JobMatchRanker`]; nothing in the
/// pipeline reads the environment directly.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    /// Minimum LLM match score (0.0 – 1.0) for a candidate to be accepted.
    pub min_match_score: f64,
    /// Candidates below this retrieval similarity never reach the LLM.
    pub min_semantic_similarity: f64,
    pub small_corpus_max: usize,
    pub small_corpus_pool: usize,
    pub medium_corpus_max: usize,
    pub medium_corpus_pool: usize,
    pub large_corpus_pool: usize,
    /// Job description characters included per scoring prompt.
    pub job_text_char_limit: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub completion_timeout: Duration,
    pub default_n_results: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_match_score: 0.60,
            min_semantic_similarity: 0.35,
            small_corpus_max: 500,
            small_corpus_pool: 50,
            medium_corpus_max: 5000,
            medium_corpus_pool: 50,
            large_corpus_pool: 75,
            job_text_char_limit: 2000,
            max_tokens: 1000,
            temperature: 0.7,
            completion_timeout: Duration::from_secs(60),
            default_n_results: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource { lookup: &lookup };

        let primary: LlmProvider = env.parse_or("PRIMARY_LLM", LlmProvider::Groq)?;
        let openai_api_key = env.optional("OPENAI_API_KEY");

        let llm = LlmSettings {
            primary,
            supervisor: env.parse_or("SUPERVISOR_LLM", primary)?,
            job_matcher: env.parse_or("JOB_MATCHER_LLM", primary)?,
            resume_coach: env.parse_or("RESUME_COACH_LLM", primary)?,
            interview_prep: env.parse_or("INTERVIEW_PREP_LLM", primary)?,
            anthropic_api_key: env.optional("ANTHROPIC_API_KEY"),
            openai_api_key: openai_api_key.clone(),
            groq_api_key: env.optional("GROQ_API_KEY"),
            gemini_api_key: env.optional("GEMINI_API_KEY"),
            anthropic_model: env.string_or("ANTHROPIC_MODEL", "claude-sonnet-4-5"),
            openai_model: env.string_or("OPENAI_MODEL", "gpt-4o-mini"),
            groq_model: env.string_or("GROQ_MODEL", "llama-3.3-70b-versatile"),
            gemini_model: env.string_or("GEMINI_MODEL", "gemini-2.5-flash"),
            openai_base_url: env.string_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            max_attempts: env.parse_or("LLM_MAX_ATTEMPTS", 3)?,
        };
        llm.validate()?;

        // Embeddings always go through OpenAI, whatever completion backend is selected.
        let embedding = EmbeddingSettings {
            api_key: openai_api_key.context(
                "Required environment variable 'OPENAI_API_KEY' is not set (needed for embeddings)",
            )?,
            model: env.string_or("OPENAI_EMBEDDING_MODEL", "text-embedding-3-small"),
            dimensions: env.parse_or("EMBEDDING_DIMENSIONS", 1536)?,
            base_url: llm.openai_base_url.clone(),
        };

        let vector_store = VectorStoreSettings {
            backend: env.parse_or("VECTOR_BACKEND", VectorBackend::Memory)?,
            qdrant_url: env.string_or("QDRANT_URL", "http://localhost:6334"),
            jobs_collection: env.string_or("JOBS_COLLECTION", "job_descriptions"),
            snapshot_path: env.optional("VECTOR_SNAPSHOT_PATH").map(PathBuf::from),
        };

        let defaults = MatchingConfig::default();
        let matching = MatchingConfig {
            min_match_score: env.parse_or("MIN_JOB_MATCH_SCORE", defaults.min_match_score)?,
            min_semantic_similarity: env
                .parse_or("MIN_SEMANTIC_SIMILARITY", defaults.min_semantic_similarity)?,
            small_corpus_max: env.parse_or("SMALL_CORPUS_MAX", defaults.small_corpus_max)?,
            small_corpus_pool: env.parse_or("SMALL_CORPUS_POOL", defaults.small_corpus_pool)?,
            medium_corpus_max: env.parse_or("MEDIUM_CORPUS_MAX", defaults.medium_corpus_max)?,
            medium_corpus_pool: env.parse_or("MEDIUM_CORPUS_POOL", defaults.medium_corpus_pool)?,
            large_corpus_pool: env.parse_or("LARGE_CORPUS_POOL", defaults.large_corpus_pool)?,
            job_text_char_limit: env
                .parse_or("JOB_TEXT_CHAR_LIMIT", defaults.job_text_char_limit)?,
            max_tokens: env.parse_or("MATCH_MAX_TOKENS", defaults.max_tokens)?,
            temperature: env.parse_or("MATCH_TEMPERATURE", defaults.temperature)?,
            completion_timeout: Duration::from_secs(
                env.parse_or("COMPLETION_TIMEOUT_SECS", defaults.completion_timeout.as_secs())?,
            ),
            default_n_results: env.parse_or("DEFAULT_N_RESULTS", defaults.default_n_results)?,
        };
        matching.validate()?;

        Ok(Config {
            port: env
                .parse_or("PORT", 8080)
                .context("PORT must be a valid port number")?,
            rust_log: env.string_or("RUST_LOG", "info"),
            max_upload_mb: env.parse_or("MAX_UPLOAD_MB", 5)?,
            top_k_retrieval: env.parse_or("TOP_K_RETRIEVAL", 3)?,
            kaggle_data_dir: PathBuf::from(env.string_or("KAGGLE_DATA_DIR", "data/kaggle")),
            llm,
            embedding,
            vector_store,
            matching,
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

impl LlmSettings {
    pub fn api_key(&self, provider: LlmProvider) -> Option<&str> {
        match provider {
            LlmProvider::Anthropic => self.anthropic_api_key.as_deref(),
            LlmProvider::OpenAi => self.openai_api_key.as_deref(),
            LlmProvider::Groq => self.groq_api_key.as_deref(),
            LlmProvider::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    pub fn model(&self, provider: LlmProvider) -> &str {
        match provider {
            LlmProvider::Anthropic => &self.anthropic_model,
            LlmProvider::OpenAi => &self.openai_model,
            LlmProvider::Groq => &self.groq_model,
            LlmProvider::Gemini => &self.gemini_model,
        }
    }

    /// Every provider assigned to an agent must have credentials.
    pub fn validate(&self) -> Result<()> {
        let assignments = [
            ("PRIMARY_LLM", self.primary),
            ("SUPERVISOR_LLM", self.supervisor),
            ("JOB_MATCHER_LLM", self.job_matcher),
            ("RESUME_COACH_LLM", self.resume_coach),
            ("INTERVIEW_PREP_LLM", self.interview_prep),
        ];

        for (setting, provider) in assignments {
            if self.api_key(provider).map_or(true, |k| k.trim().is_empty()) {
                bail!(
                    "{setting} selects '{provider}' but {} is not set",
                    provider.api_key_var()
                );
            }
        }

        if self.max_attempts == 0 {
            bail!("LLM_MAX_ATTEMPTS must be at least 1");
        }

        Ok(())
    }
}

impl MatchingConfig {
    /// Candidate pool size for a corpus of `total_jobs`, never larger than the corpus.
    pub fn pool_size(&self, total_jobs: usize) -> usize {
        let tier = if total_jobs <= self.small_corpus_max {
            self.small_corpus_pool
        } else if total_jobs <= self.medium_corpus_max {
            self.medium_corpus_pool
        } else {
            self.large_corpus_pool
        };
        tier.min(total_jobs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_match_score) {
            bail!("MIN_JOB_MATCH_SCORE must be between 0.0 and 1.0");
        }
        if !(0.0..=1.0).contains(&self.min_semantic_similarity) {
            bail!("MIN_SEMANTIC_SIMILARITY must be between 0.0 and 1.0");
        }
        if self.small_corpus_max > self.medium_corpus_max {
            bail!("SMALL_CORPUS_MAX must not exceed MEDIUM_CORPUS_MAX");
        }
        if !(1..=MAX_N_RESULTS).contains(&self.default_n_results) {
            bail!("DEFAULT_N_RESULTS must be between 1 and {MAX_N_RESULTS}");
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lookup helpers
// ────────────────────────────────────────────────────────────────────────────

struct EnvSource<'a, F> {
    lookup: &'a F,
}

impl<F> EnvSource<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("Environment variable '{key}' is invalid: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_minimal_environment() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("GROQ_API_KEY", "gsk-test"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.kaggle_data_dir, PathBuf::from("data/kaggle"));
        assert_eq!(config.llm.primary, LlmProvider::Groq);
        assert_eq!(config.llm.job_matcher, LlmProvider::Groq);
        assert_eq!(config.embedding.dimensions, 1536);
        assert_eq!(config.vector_store.jobs_collection, "job_descriptions");
        assert_eq!(config.vector_store.backend, VectorBackend::Memory);
        assert_eq!(config.matching, MatchingConfig::default());
    }

    #[test]
    fn test_missing_openai_key_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[
            ("PRIMARY_LLM", "groq"),
            ("GROQ_API_KEY", "gsk-test"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_agent_override_requires_its_own_key() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("GROQ_API_KEY", "gsk-test"),
            ("RESUME_COACH_LLM", "gemini"),
        ]))
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("RESUME_COACH_LLM"), "{message}");
        assert!(message.contains("GEMINI_API_KEY"), "{message}");
    }

    #[test]
    fn test_matching_overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PRIMARY_LLM", "openai"),
            ("MIN_JOB_MATCH_SCORE", "0.75"),
            ("MIN_SEMANTIC_SIMILARITY", "0.4"),
            ("COMPLETION_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.matching.min_match_score, 0.75);
        assert_eq!(config.matching.min_semantic_similarity, 0.4);
        assert_eq!(config.matching.completion_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PRIMARY_LLM", "openai"),
            ("MIN_JOB_MATCH_SCORE", "60"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_n_results_outside_request_range_rejected() {
        for value in ["0", "21"] {
            let err = Config::from_lookup(lookup_from(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("PRIMARY_LLM", "openai"),
                ("DEFAULT_N_RESULTS", value),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains("DEFAULT_N_RESULTS"), "{err}");
        }

        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PRIMARY_LLM", "openai"),
            ("DEFAULT_N_RESULTS", "20"),
        ]))
        .unwrap();
        assert_eq!(config.matching.default_n_results, 20);
    }

    #[test]
    fn test_malformed_number_names_the_variable() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PRIMARY_LLM", "openai"),
            ("TOP_K_RETRIEVAL", "three"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TOP_K_RETRIEVAL"));
    }

    #[test]
    fn test_pool_size_tiers() {
        let config = MatchingConfig::default();
        assert_eq!(config.pool_size(0), 0);
        assert_eq!(config.pool_size(10), 10);
        assert_eq!(config.pool_size(500), 50);
        assert_eq!(config.pool_size(501), 50);
        assert_eq!(config.pool_size(5000), 50);
        assert_eq!(config.pool_size(5001), 75);
        assert_eq!(config.pool_size(100_000), 75);
    }
}
