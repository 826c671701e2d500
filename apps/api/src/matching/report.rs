use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::job::JobPosting;

/// Outcome class of one ranking pass. Only retrieval failures are errors;
/// every other outcome is a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// The corpus holds no jobs; retrieval was never attempted.
    CorpusEmpty,
    /// Retrieval returned nothing (for example, a filter excluded every job).
    NoCandidates,
    /// Candidates were scored but none reached the threshold.
    NoMatchesAboveThreshold,
    Matched,
}

/// A job accepted by the ranker.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Discovery position, 1-based. Not a score ranking.
    pub rank: usize,
    /// LLM match score in [0, 1].
    pub score: f64,
    pub similarity_score: f64,
    pub job: JobPosting,
    /// The model's analysis, with its job heading renumbered to `rank`.
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub total_jobs: usize,
    /// Candidates requested from the retriever for this corpus size.
    pub pool_size: usize,
    pub retrieved: usize,
    /// Candidates left after the similarity pre-filter.
    pub pre_filtered: usize,
    /// Candidates sent to the LLM.
    pub checked: usize,
    pub scoring_failures: usize,
    pub unparseable_scores: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub status: MatchStatus,
    pub search_query: String,
    pub n_results: usize,
    pub min_match_score: f64,
    pub matches: Vec<MatchResult>,
    pub stats: MatchStats,
    pub generated_at: DateTime<Utc>,
}

impl MatchReport {
    pub fn new(
        status: MatchStatus,
        search_query: String,
        n_results: usize,
        min_match_score: f64,
        matches: Vec<MatchResult>,
        stats: MatchStats,
    ) -> Self {
        Self {
            status,
            search_query,
            n_results,
            min_match_score,
            matches,
            stats,
            generated_at: Utc::now(),
        }
    }

    /// Chat-ready Markdown for this report.
    pub fn render_markdown(&self) -> String {
        let threshold = format!("{:.0}%", self.min_match_score * 100.0);

        match self.status {
            MatchStatus::CorpusEmpty => "I couldn't find any jobs in the database. \
                 Please load job postings first, then try again."
                .to_string(),
            MatchStatus::NoCandidates => "I couldn't find any matching jobs in the database. \
                 Try loading more job postings, relaxing your filters, or adjusting your resume."
                .to_string(),
            MatchStatus::NoMatchesAboveThreshold => format!(
                "⚠️ **No jobs found above {threshold} match threshold.**\n\n\
                 I checked {checked} jobs from the database (pre-filtered from {retrieved} \
                 candidates), but none met the {threshold} match threshold.\n\n\
                 Consider:\n\
                 - Expanding your search criteria\n\
                 - Adjusting the match threshold\n\
                 - Reviewing jobs with lower scores to see if any are still relevant",
                checked = self.stats.checked,
                retrieved = self.stats.retrieved,
            ),
            MatchStatus::Matched => {
                let count = self.matches.len();
                let mut out = format!(
                    "## 🎯 {count} Job Matches Found (First {count} Above {threshold} Threshold)\n\n"
                );
                let sections: Vec<&str> =
                    self.matches.iter().map(|m| m.explanation.trim()).collect();
                out.push_str(&sections.join("\n\n---\n\n"));
                out
            }
        }
    }
}
