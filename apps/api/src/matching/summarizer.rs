//! Builds a compact retrieval query from a long resume.
//!
//! Embedding the whole resume dilutes the signal, so the query is assembled
//! from the summary, skills and experience sections plus any recognised job
//! titles. Pure and deterministic.

use std::sync::LazyLock;

use regex::Regex;

use crate::rag::context_builder::truncate_chars;

const SUMMARY_CHARS: usize = 200;
const SKILLS_CHARS: usize = 300;
const EXPERIENCE_CHARS: usize = 300;
const FALLBACK_CHARS: usize = 1000;
const MAX_QUERY_CHARS: usize = 2000;
const MAX_TITLES: usize = 5;

/// A header keyword at the start of a line, followed by `:`/`;` or end of line
/// (a trailing `\r` is tolerated).
/// Longer alternatives come first so "Work Experience" wins over "Experience".
static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?P<name>professional\s+summary|career\s+summary|summary|career\s+objective|objective|professional\s+profile|profile|about\s+me|about|technical\s+skills?|core\s+competencies|competencies|skills?|areas\s+of\s+expertise|expertise|professional\s+experience|work\s+experience|volunteer\s+experience|experience|employment\s+history|employment|education|academic\s+background|projects?|certifications?|awards|publications|languages|interests|references)[ \t]*(?:[:;]|\r?$)",
    )
    .expect("section header pattern is valid")
});

static JOB_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:Senior|Junior|Lead|Principal)\s+)?(?:(?:Software|Data|ML|AI|Backend|Frontend|Full\s+Stack)\s+)?(?:Engineer|Developer|Scientist|Architect|Analyst|Manager)\b",
    )
    .expect("job title pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Summary,
    Skills,
    Experience,
    Other,
}

fn classify(header: &str) -> SectionKind {
    let header = header.to_lowercase();
    if header.starts_with("volunteer") {
        SectionKind::Other
    } else if ["summary", "objective", "profile", "about"]
        .iter()
        .any(|k| header.contains(k))
    {
        SectionKind::Summary
    } else if ["skill", "competenc", "expertise"]
        .iter()
        .any(|k| header.contains(k))
    {
        SectionKind::Skills
    } else if header.contains("experience") || header.contains("employment") {
        SectionKind::Experience
    } else {
        SectionKind::Other
    }
}

#[derive(Debug, Default, PartialEq)]
struct ResumeSections<'a> {
    summary: Option<&'a str>,
    skills: Option<&'a str>,
    experience: Option<&'a str>,
}

/// Finds the first non-empty summary, skills and experience sections.
/// A section's body runs from its header to the next recognised header.
fn locate_sections(resume_text: &str) -> ResumeSections<'_> {
    let headers: Vec<(SectionKind, usize, usize)> = SECTION_HEADER
        .captures_iter(resume_text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.name("name")?;
            Some((classify(name.as_str()), whole.start(), whole.end()))
        })
        .collect();

    let mut sections = ResumeSections::default();
    for (i, &(kind, _, body_start)) in headers.iter().enumerate() {
        let body_end = headers
            .get(i + 1)
            .map_or(resume_text.len(), |&(_, next_start, _)| next_start);
        let body = resume_text[body_start..body_end].trim();
        if body.is_empty() {
            continue;
        }
        let slot = match kind {
            SectionKind::Summary => &mut sections.summary,
            SectionKind::Skills => &mut sections.skills,
            SectionKind::Experience => &mut sections.experience,
            SectionKind::Other => continue,
        };
        if slot.is_none() {
            *slot = Some(body);
        }
    }
    sections
}

/// Distinct job titles in order of first appearance, at most five.
fn job_titles(experience: &str) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    for m in JOB_TITLE.find_iter(experience) {
        let title = collapse_whitespace(m.as_str());
        if !titles.iter().any(|t| t.eq_ignore_ascii_case(&title)) {
            titles.push(title);
        }
        if titles.len() == MAX_TITLES {
            break;
        }
    }
    titles
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derives the semantic search query for `resume_text`.
///
/// Falls back to the opening of the resume when no known section is found.
/// The result is whitespace-normalised and at most 2000 characters.
pub fn extract_search_query(resume_text: &str) -> String {
    let resume_text = resume_text.replace("\r\n", "\n");
    let resume_text = resume_text.as_str();
    let sections = locate_sections(resume_text);
    let mut parts: Vec<String> = Vec::new();

    if let Some(summary) = sections.summary {
        parts.push(truncate_chars(summary, SUMMARY_CHARS).to_string());
    }
    if let Some(skills) = sections.skills {
        parts.push(truncate_chars(skills, SKILLS_CHARS).to_string());
    }
    if let Some(experience) = sections.experience {
        let titles = job_titles(experience);
        if !titles.is_empty() {
            parts.push(titles.join(" "));
        }
        parts.push(truncate_chars(experience, EXPERIENCE_CHARS).to_string());
    }

    if parts.is_empty() {
        parts.push(truncate_chars(resume_text, FALLBACK_CHARS).to_string());
    }

    let query = collapse_whitespace(&parts.join(" "));
    truncate_chars(&query, MAX_QUERY_CHARS).to_string()
}
