//! Job corpus loading: raw postings → cleaned `JobPosting`s → embedded batches.

pub mod handlers;
pub mod kaggle;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::embedding::EmbeddingService;
use crate::models::job::{JobMetadata, JobPosting};
use crate::vector_store::{IndexedJob, VectorIndex, VectorStoreError};

pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Descriptions this short or shorter are dropped when cleaning.
const MIN_DESCRIPTION_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("batch_size must be at least 1")]
    InvalidBatchSize,

    #[error("failed to clear job index: {0}")]
    Clear(#[source] VectorStoreError),

    #[error("failed to count jobs: {0}")]
    Count(#[source] VectorStoreError),

    #[error("cannot open {path}: {source}")]
    MissingFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file} has no '{column}' column")]
    MissingColumn {
        file: &'static str,
        column: &'static str,
    },

    #[error("failed to read {file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },
}

/// One row of a job postings export (LinkedIn postings column names).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawJobListing {
    pub job_id: String,
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "work_type")]
    pub formatted_work_type: Option<String>,
    #[serde(alias = "experience_level")]
    pub formatted_experience_level: Option<String>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub pay_period: Option<String>,
    #[serde(alias = "skills_desc")]
    pub required_skills: Option<String>,
    pub remote_allowed: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Drop short descriptions and duplicate (title, description) pairs.
    pub clean: bool,
    pub clear_existing: bool,
    pub batch_size: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            clean: true,
            clear_existing: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    pub received: usize,
    pub kept: usize,
    pub loaded: usize,
    pub failed_batches: usize,
    pub total_jobs: usize,
    pub completed_at: DateTime<Utc>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Whole-dollar amount with thousands separators, e.g. `120,000`.
fn format_amount(amount: f64) -> String {
    let digits = (amount.trunc() as i64).unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if amount < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// The document text that gets embedded for a listing.
pub fn build_job_text(raw: &RawJobListing) -> String {
    let mut parts: Vec<String> = Vec::new();

    let labelled = [
        ("Job Title", present(&raw.title)),
        ("Company", present(&raw.company_name)),
        ("Location", present(&raw.location)),
        ("Work Type", present(&raw.formatted_work_type)),
        ("Experience Level", present(&raw.formatted_experience_level)),
    ];
    for (label, value) in labelled {
        if let Some(value) = value {
            parts.push(format!("{label}: {value}"));
        }
    }

    if let (Some(min), Some(max)) = (raw.min_salary, raw.max_salary) {
        let mut salary = format!("Salary: ${} - ${}", format_amount(min), format_amount(max));
        if let Some(period) = present(&raw.pay_period) {
            salary.push(' ');
            salary.push_str(period);
        }
        parts.push(salary);
    }

    if let Some(skills) = present(&raw.required_skills) {
        parts.push(format!("Required Skills: {skills}"));
    }
    if let Some(description) = present(&raw.description) {
        parts.push(format!("\nJob Description:\n{description}"));
    }

    parts.join("\n")
}

pub fn to_posting(raw: &RawJobListing) -> JobPosting {
    let or_unknown = |field: &Option<String>| present(field).unwrap_or("Unknown").to_string();
    JobPosting {
        id: format!("job_{}", raw.job_id.trim()),
        text: build_job_text(raw),
        metadata: JobMetadata {
            title: or_unknown(&raw.title),
            company: or_unknown(&raw.company_name),
            location: or_unknown(&raw.location),
            work_type: present(&raw.formatted_work_type).map(str::to_string),
            experience_level: present(&raw.formatted_experience_level).map(str::to_string),
            salary_min: raw.min_salary,
            salary_max: raw.max_salary,
            remote_allowed: raw.remote_allowed,
        },
    }
}

/// Drops listings without a meaningful description and repeated
/// (title, description) pairs. The first occurrence wins.
pub fn clean_listings(listings: Vec<RawJobListing>) -> Vec<RawJobListing> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    listings
        .into_iter()
        .filter(|raw| {
            let Some(description) = raw.description.as_deref() else {
                return false;
            };
            if description.chars().count() <= MIN_DESCRIPTION_CHARS {
                return false;
            }
            seen.insert((
                raw.title.clone().unwrap_or_default(),
                description.to_string(),
            ))
        })
        .collect()
}

/// Writes postings into the job index.
#[derive(Clone)]
pub struct JobIngestor {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingService>,
}

impl JobIngestor {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn EmbeddingService>) -> Self {
        Self { index, embedder }
    }

    /// Loads `listings` in batches of `options.batch_size`.
    ///
    /// A batch that fails to embed or upsert is logged and counted; later
    /// batches still run. Only clearing and the final count are fatal.
    pub async fn ingest(
        &self,
        listings: Vec<RawJobListing>,
        options: &IngestOptions,
    ) -> Result<IngestSummary, IngestError> {
        if options.batch_size == 0 {
            return Err(IngestError::InvalidBatchSize);
        }

        let received = listings.len();
        let listings = if options.clean {
            clean_listings(listings)
        } else {
            listings
        };
        let kept = listings.len();
        if kept < received {
            info!(kept, removed = received - kept, "Cleaned job listings");
        }

        if options.clear_existing {
            self.index.clear().await.map_err(IngestError::Clear)?;
            info!("Cleared existing jobs before load");
        }

        let postings: Vec<JobPosting> = listings.iter().map(to_posting).collect();
        let batch_count = postings.len().div_ceil(options.batch_size);
        let mut loaded = 0;
        let mut failed_batches = 0;

        for (i, batch) in postings.chunks(options.batch_size).enumerate() {
            match self.load_batch(batch).await {
                Ok(()) => {
                    loaded += batch.len();
                    info!(batch = i + 1, batch_count, loaded, "Loaded job batch");
                }
                Err(e) => {
                    failed_batches += 1;
                    warn!(batch = i + 1, batch_count, "Job batch failed: {e}");
                }
            }
        }

        let total_jobs = self.index.count().await.map_err(IngestError::Count)?;
        info!(received, kept, loaded, failed_batches, total_jobs, "Job ingest finished");

        Ok(IngestSummary {
            received,
            kept,
            loaded,
            failed_batches,
            total_jobs,
            completed_at: Utc::now(),
        })
    }

    async fn load_batch(&self, batch: &[JobPosting]) -> anyhow::Result<()> {
        let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        let jobs = batch
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(posting, vector)| IndexedJob { posting, vector })
            .collect();
        self.index.upsert(jobs).await?;
        Ok(())
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::embedding::mock::FixedEmbedder;
    use crate::embedding::EmbeddingError;
    use crate::vector_store::MemoryJobIndex;

    fn listing(id: &str, title: &str, description: &str) -> RawJobListing {
        RawJobListing {
            job_id: id.to_string(),
            title: Some(title.to_string()),
            company_name: Some("Acme".to_string()),
            location: Some("Berlin".to_string()),
            description: Some(description.to_string()),
            ..RawJobListing::default()
        }
    }

    fn long_description(seed: &str) -> String {
        format!("{seed}: design, build and operate distributed backend services in Rust.")
    }

    /// Fails any batch containing a text with the marker.
    struct MarkerFailingEmbedder;

    #[async_trait]
    impl EmbeddingService for MarkerFailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if texts.iter().any(|t| t.contains("EXPLODE")) {
                return Err(EmbeddingError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(vec![vec![1.0, 0.0]; texts.len()])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_job_text_layout() {
        let raw = RawJobListing {
            formatted_work_type: Some("Full-time".to_string()),
            formatted_experience_level: Some("Mid-Senior level".to_string()),
            min_salary: Some(90_000.0),
            max_salary: Some(120_000.0),
            pay_period: Some("YEARLY".to_string()),
            required_skills: Some("Rust, Kafka".to_string()),
            ..listing("42", "Backend Engineer", "Build services.")
        };

        assert_eq!(
            build_job_text(&raw),
            "Job Title: Backend Engineer\nCompany: Acme\nLocation: Berlin\nWork Type: Full-time\n\
             Experience Level: Mid-Senior level\nSalary: $90,000 - $120,000 YEARLY\n\
             Required Skills: Rust, Kafka\n\nJob Description:\nBuild services."
        );
    }

    #[test]
    fn test_salary_needs_both_bounds() {
        let raw = RawJobListing {
            max_salary: Some(100_000.0),
            ..listing("1", "Engineer", "x")
        };
        assert!(!build_job_text(&raw).contains("Salary"));
    }

    #[test]
    fn test_posting_id_and_metadata() {
        let raw = RawJobListing {
            company_name: None,
            remote_allowed: Some(true),
            max_salary: Some(80_000.0),
            ..listing(" 7 ", "Engineer", "x")
        };
        let posting = to_posting(&raw);
        assert_eq!(posting.id, "job_7");
        assert_eq!(posting.metadata.company, "Unknown");
        assert_eq!(posting.metadata.remote_allowed, Some(true));
        assert_eq!(posting.metadata.salary_max, Some(80_000.0));
        assert!(!posting.text.contains("Company:"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1_000.0), "1,000");
        assert_eq!(format_amount(1_234_567.89), "1,234,567");
    }

    #[test]
    fn test_cleaning_drops_short_and_duplicate_listings() {
        let kept = clean_listings(vec![
            listing("1", "Engineer", &long_description("a")),
            listing("2", "Engineer", &long_description("a")),
            listing("3", "Analyst", &long_description("a")),
            listing("4", "Engineer", &"x".repeat(50)),
            RawJobListing {
                description: None,
                ..listing("5", "Engineer", "")
            },
        ]);
        let ids: Vec<_> = kept.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_ingest_loads_in_batches() {
        let index = Arc::new(MemoryJobIndex::new(2));
        let embedder = Arc::new(FixedEmbedder::new(vec![1.0, 0.0]));
        let ingestor = JobIngestor::new(index.clone(), embedder);

        let listings = (1..=5)
            .map(|i| listing(&i.to_string(), &format!("Role {i}"), &long_description(&i.to_string())))
            .collect();
        let summary = ingestor
            .ingest(
                listings,
                &IngestOptions {
                    batch_size: 2,
                    ..IngestOptions::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.received, 5);
        assert_eq!(summary.kept, 5);
        assert_eq!(summary.loaded, 5);
        assert_eq!(summary.failed_batches, 0);
        assert_eq!(summary.total_jobs, 5);
        assert!(index.get("job_3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_later_batches() {
        let index = Arc::new(MemoryJobIndex::new(2));
        let ingestor = JobIngestor::new(index.clone(), Arc::new(MarkerFailingEmbedder));

        let listings = vec![
            listing("1", "A", &long_description("one")),
            listing("2", "B", &long_description("EXPLODE")),
            listing("3", "C", &long_description("three")),
        ];
        let summary = ingestor
            .ingest(
                listings,
                &IngestOptions {
                    batch_size: 1,
                    ..IngestOptions::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.loaded, 2);
        assert_eq!(summary.failed_batches, 1);
        assert_eq!(summary.total_jobs, 2);
        assert!(index.get("job_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_existing_replaces_corpus() {
        let index = Arc::new(MemoryJobIndex::new(2));
        let ingestor =
            JobIngestor::new(index.clone(), Arc::new(FixedEmbedder::new(vec![1.0, 0.0])));

        ingestor
            .ingest(vec![listing("1", "Old", &long_description("old"))], &IngestOptions::default())
            .await
            .unwrap();
        let summary = ingestor
            .ingest(
                vec![listing("2", "New", &long_description("new"))],
                &IngestOptions {
                    clear_existing: true,
                    ..IngestOptions::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.total_jobs, 1);
        assert!(index.get("job_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() {
        let ingestor = JobIngestor::new(
            Arc::new(MemoryJobIndex::new(2)),
            Arc::new(FixedEmbedder::new(vec![1.0, 0.0])),
        );
        let err = ingestor
            .ingest(
                Vec::new(),
                &IngestOptions {
                    batch_size: 0,
                    ..IngestOptions::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidBatchSize));
    }
}
