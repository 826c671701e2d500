use serde::{Deserialize, Serialize};

/// A job posting as stored in the vector index.
///
/// `text` is the full document that was embedded; `metadata` carries the
/// structured fields used for display and filtering. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub text: String,
    pub metadata: JobMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_allowed: Option<bool>,
}

impl JobMetadata {
    /// Company name, or a placeholder when the posting omitted it.
    pub fn company_or_unknown(&self) -> &str {
        if self.company.trim().is_empty() {
            "Unknown"
        } else {
            &self.company
        }
    }
}

/// Structured metadata filter applied during retrieval.
///
/// Keyword fields match exactly (case-insensitive in the in-memory index);
/// `min_salary` keeps postings whose `salary_max` reaches the bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFilter {
    pub location: Option<String>,
    pub company: Option<String>,
    pub work_type: Option<String>,
    pub experience_level: Option<String>,
    pub remote_allowed: Option<bool>,
    pub min_salary: Option<f64>,
}

impl JobFilter {
    pub fn is_empty(&self) -> bool {
        self == &JobFilter::default()
    }

    pub fn matches(&self, metadata: &JobMetadata) -> bool {
        fn same(expected: &Option<String>, actual: Option<&str>) -> bool {
            match expected {
                None => true,
                Some(want) => actual.is_some_and(|have| have.eq_ignore_ascii_case(want)),
            }
        }

        same(&self.location, Some(&metadata.location))
            && same(&self.company, Some(&metadata.company))
            && same(&self.work_type, metadata.work_type.as_deref())
            && same(&self.experience_level, metadata.experience_level.as_deref())
            && self
                .remote_allowed
                .map_or(true, |want| metadata.remote_allowed == Some(want))
            && self
                .min_salary
                .map_or(true, |floor| metadata.salary_max.is_some_and(|max| max >= floor))
    }
}

#[cfg(test)]
pub(crate) fn sample_job(id: &str, title: &str) -> JobPosting {
    JobPosting {
        id: id.to_string(),
        text: format!("Job Title: {title}\nCompany: Acme\nLocation: Remote\n\nJob Description:\nBuild things."),
        metadata: JobMetadata {
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            ..JobMetadata::default()
        },
    }
}
