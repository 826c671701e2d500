//! Pulls numeric match scores out of free-text LLM responses.
//!
//! LLM output is not a stable machine format, so every inspection of raw
//! response text in the matching pipeline goes through this module.

use std::sync::LazyLock;

use regex::Regex;

/// Score patterns in priority order. Each captures the percentage in group 1.
static SCORE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // "**Overall Match Score:** 85%", "Overall Match Score - 85 %"
        Regex::new(r"(?i)Overall\s+Match\s+Score[\s:*\-]*(\d[\d.]*)\s*%")
            .expect("overall score pattern is valid"),
        Regex::new(r"(?i)Match\s+Score[\s:*\-]*(\d[\d.]*)\s*%")
            .expect("match score pattern is valid"),
        Regex::new(r"(?i)(\d[\d.]*)\s*%\s+match").expect("percent match pattern is valid"),
    ]
});

static JOB_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)###\s*Job\s*#?\s*\d+\s*:").expect("job heading pattern is valid")
});

/// Extracts a score in [0, 1] scale (percentage / 100) from `text`.
///
/// Patterns are tried in priority order; a capture that does not parse as a
/// finite number falls through to the next pattern. Returns `None` when nothing
/// matches, which callers treat as a score of 0.
pub fn extract_score(text: &str) -> Option<f64> {
    SCORE_PATTERNS.iter().find_map(|pattern| {
        let captured = pattern.captures(text)?.get(1)?.as_str();
        captured
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|pct| pct / 100.0)
    })
}

/// One `### Job #n:` section of a multi-job response, heading included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobSection<'a> {
    pub text: &'a str,
}

/// Splits a multi-job response at each `### Job #<n>:` heading.
///
/// Text before the first heading is discarded. Returns an empty vector when the
/// response has no headings.
pub fn split_job_sections(text: &str) -> Vec<JobSection<'_>> {
    let starts: Vec<usize> = JOB_HEADING.find_iter(text).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            JobSection {
                text: &text[start..end],
            }
        })
        .collect()
}

/// Score for one section, mapped back to the candidate it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionScore<'a> {
    pub candidate_index: usize,
    /// Absent scores are reported as 0.0.
    pub score: f64,
    pub parsed: bool,
    pub section: &'a str,
}

/// Scores every section of a multi-job response.
///
/// Section `i` describes candidate `start_offset + i`; sections beyond
/// `candidate_count` are ignored.
pub fn extract_section_scores(
    text: &str,
    candidate_count: usize,
    start_offset: usize,
) -> Vec<SectionScore<'_>> {
    split_job_sections(text)
        .into_iter()
        .enumerate()
        .filter_map(|(i, section)| {
            let candidate_index = start_offset + i;
            if candidate_index >= candidate_count {
                return None;
            }
            let extracted = extract_score(section.text);
            Some(SectionScore {
                candidate_index,
                score: extracted.unwrap_or(0.0),
                parsed: extracted.is_some(),
                section: section.text,
            })
        })
        .collect()
}

/// Score and explanation for a response about exactly one candidate.
///
/// When the model wrapped its answer in job headings only the first section
/// counts; otherwise the whole response is scored.
pub fn extract_candidate_score(text: &str) -> (Option<f64>, &str) {
    match extract_section_scores(text, 1, 0).into_iter().next() {
        Some(scored) => (scored.parsed.then_some(scored.score), scored.section),
        None => (extract_score(text), text),
    }
}

/// Rewrites the first job heading in `section` to `### Job #<rank>:`.
/// Returns `None` when the section has no heading.
pub fn renumber_job_heading(section: &str, rank: usize) -> Option<String> {
    let heading = JOB_HEADING.find(section)?;
    Some(format!(
        "{}### Job #{rank}:{}",
        &section[..heading.start()],
        &section[heading.end()..]
    ))
}
