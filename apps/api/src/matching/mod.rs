//! Job matching: resume-driven retrieval, per-candidate LLM scoring and reporting.

pub mod handlers;
pub mod prompts;
pub mod ranker;
pub mod report;
pub mod score_extractor;
pub mod summarizer;

pub use ranker::{JobMatchRanker, MatchRequest};
pub use report::MatchReport;
