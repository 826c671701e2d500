//! Assembles retrieved documents and user input into prompt contexts.

use crate::rag::retriever::RetrievedCandidate;

const SECTION_RULE_WIDTH: usize = 80;
const JOB_TRUNCATION_MARKER: &str = "\n[... Job description truncated for efficiency ...]";
const CONTEXT_TRUNCATION_MARKER: &str = "\n\n[... Context truncated due to length ...]";
/// Rough characters-per-token ratio used for context budgeting.
const CHARS_PER_TOKEN: usize = 4;

/// Returns the first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Context for scoring resume fit against one or more jobs.
///
/// The resume is always included in full; each job's text is capped at
/// `job_char_limit` characters with a visible marker when cut.
pub fn build_job_matching_context(
    resume_text: &str,
    candidates: &[RetrievedCandidate],
    user_query: Option<&str>,
    job_char_limit: usize,
) -> String {
    let rule = "=".repeat(SECTION_RULE_WIDTH);
    let mut parts: Vec<String> = vec![
        rule.clone(),
        "=== CANDIDATE'S COMPLETE RESUME ===".to_string(),
        rule.clone(),
        String::new(),
        "IMPORTANT: This is the COMPLETE resume. Analyze ALL sections:".to_string(),
        "- Skills (technical and soft skills)".to_string(),
        "- Work Experience (ALL roles, not just the most recent)".to_string(),
        "- Education and Certifications".to_string(),
        "- Projects and Achievements".to_string(),
        "- Summary/Objective (if present)".to_string(),
        String::new(),
        "RESUME CONTENT:".to_string(),
        resume_text.to_string(),
        String::new(),
        rule,
        String::new(),
        "=== RELEVANT JOB POSTINGS ===".to_string(),
    ];

    for candidate in candidates {
        let meta = &candidate.job.metadata;
        parts.push(format!("\n[Job {}: {}]", candidate.rank, meta.title));
        parts.push(format!("Company: {}", meta.company_or_unknown()));
        parts.push(format!("Location: {}", meta.location));
        parts.push(format!(
            "Semantic Match Score: {:.2}%",
            candidate.similarity_score * 100.0
        ));
        parts.push(format!(
            "\nJob Description:\n{}",
            cap_job_text(&candidate.job.text, job_char_limit)
        ));
        parts.push("-".repeat(SECTION_RULE_WIDTH));
    }

    if let Some(query) = user_query.filter(|q| !q.trim().is_empty()) {
        parts.push("\n=== USER'S QUESTION ===".to_string());
        parts.push(query.to_string());
    }

    parts.join("\n")
}

fn cap_job_text(text: &str, limit: usize) -> String {
    let capped = truncate_chars(text, limit);
    if capped.len() < text.len() {
        format!("{capped}{JOB_TRUNCATION_MARKER}")
    } else {
        text.to_string()
    }
}

/// Context for resume review, optionally against a target job.
pub fn build_resume_feedback_context(
    resume_text: &str,
    job_description: Option<&str>,
    focus_areas: &[String],
) -> String {
    let mut parts = vec![
        "=== RESUME TO REVIEW ===".to_string(),
        resume_text.to_string(),
        String::new(),
    ];

    if let Some(job) = job_description.filter(|j| !j.trim().is_empty()) {
        parts.push("=== TARGET JOB DESCRIPTION ===".to_string());
        parts.push(job.to_string());
        parts.push(String::new());
    }

    if !focus_areas.is_empty() {
        parts.push("=== AREAS TO FOCUS ON ===".to_string());
        parts.push(focus_areas.join(", "));
        parts.push(String::new());
    }

    parts.join("\n")
}

/// Context for interview preparation against a specific job.
pub fn build_interview_context(
    resume_text: &str,
    job_description: &str,
    company_info: Option<&str>,
) -> String {
    let mut parts = vec![
        "=== CANDIDATE'S BACKGROUND ===".to_string(),
        resume_text.to_string(),
        String::new(),
        "=== TARGET JOB ===".to_string(),
        job_description.to_string(),
        String::new(),
    ];

    if let Some(info) = company_info.filter(|c| !c.trim().is_empty()) {
        parts.push("=== COMPANY INFORMATION ===".to_string());
        parts.push(info.to_string());
        parts.push(String::new());
    }

    parts.join("\n")
}

/// Caps a context at roughly `max_tokens` tokens, marking the cut.
pub fn truncate_context(context: &str, max_tokens: usize) -> String {
    let max_chars = max_tokens * CHARS_PER_TOKEN;
    let capped = truncate_chars(context, max_chars);
    if capped.len() == context.len() {
        return context.to_string();
    }
    format!("{capped}{CONTEXT_TRUNCATION_MARKER}")
}
