//! Reader for the Kaggle LinkedIn job postings export.
//!
//! `postings.csv` is required. `skills.csv` (skill_abr → skill_name) and
//! `job_skills.csv` (job_id → skill_abr) are optional; when both are present
//! the joined skill names replace each posting's free-text `skills_desc`.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{IngestError, RawJobListing};

pub const POSTINGS_FILE: &str = "postings.csv";
pub const SKILLS_FILE: &str = "skills.csv";
pub const JOB_SKILLS_FILE: &str = "job_skills.csv";

/// The `postings.csv` columns we use. Every other column is ignored.
#[derive(Debug, Deserialize)]
struct PostingRow {
    job_id: String,
    title: Option<String>,
    company_name: Option<String>,
    location: Option<String>,
    formatted_work_type: Option<String>,
    formatted_experience_level: Option<String>,
    min_salary: Option<f64>,
    max_salary: Option<f64>,
    pay_period: Option<String>,
    skills_desc: Option<String>,
    remote_allowed: Option<String>,
    description: Option<String>,
}

impl PostingRow {
    fn into_listing(self) -> RawJobListing {
        RawJobListing {
            job_id: self.job_id,
            title: self.title,
            company_name: self.company_name,
            location: self.location,
            formatted_work_type: self.formatted_work_type,
            formatted_experience_level: self.formatted_experience_level,
            min_salary: self.min_salary,
            max_salary: self.max_salary,
            pay_period: self.pay_period,
            required_skills: self.skills_desc,
            remote_allowed: self.remote_allowed.as_deref().and_then(parse_flag),
            description: self.description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SkillRow {
    skill_abr: String,
    skill_name: String,
}

#[derive(Debug, Deserialize)]
struct JobSkillRow {
    job_id: String,
    skill_abr: String,
}

/// The export writes flags as `1.0` / `0.0`.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

fn require_column<R: Read>(
    reader: &mut csv::Reader<R>,
    file: &'static str,
    column: &'static str,
) -> Result<(), IngestError> {
    let headers = reader
        .headers()
        .map_err(|source| IngestError::Csv { file, source })?;
    if !headers.iter().any(|h| h.trim() == column) {
        return Err(IngestError::MissingColumn { file, column });
    }
    Ok(())
}

/// Reads postings in file order, stopping after `max_jobs` rows.
/// Rows that fail to parse are skipped.
pub fn read_postings<R: Read>(
    reader: R,
    max_jobs: Option<usize>,
) -> Result<Vec<RawJobListing>, IngestError> {
    let mut csv = csv::Reader::from_reader(reader);
    require_column(&mut csv, POSTINGS_FILE, "job_id")?;

    let mut listings = Vec::new();
    let mut skipped = 0;
    for row in csv.deserialize::<PostingRow>() {
        if max_jobs.is_some_and(|max| listings.len() >= max) {
            break;
        }
        match row {
            Ok(row) => listings.push(row.into_listing()),
            Err(e) => {
                skipped += 1;
                debug!("Skipping malformed postings row: {e}");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped malformed rows in {POSTINGS_FILE}");
    }
    Ok(listings)
}

/// `skill_abr` → display name.
pub fn read_skill_names<R: Read>(reader: R) -> Result<HashMap<String, String>, IngestError> {
    let mut csv = csv::Reader::from_reader(reader);
    require_column(&mut csv, SKILLS_FILE, "skill_abr")?;

    let mut names = HashMap::new();
    for row in csv.deserialize::<SkillRow>() {
        let row = row.map_err(|source| IngestError::Csv {
            file: SKILLS_FILE,
            source,
        })?;
        names.insert(row.skill_abr, row.skill_name);
    }
    Ok(names)
}

/// `job_id` → skill names in file order. Abbreviations without a name are dropped.
pub fn read_job_skills<R: Read>(
    reader: R,
    names: &HashMap<String, String>,
) -> Result<HashMap<String, Vec<String>>, IngestError> {
    let mut csv = csv::Reader::from_reader(reader);
    require_column(&mut csv, JOB_SKILLS_FILE, "job_id")?;

    let mut by_job: HashMap<String, Vec<String>> = HashMap::new();
    for row in csv.deserialize::<JobSkillRow>() {
        let row = row.map_err(|source| IngestError::Csv {
            file: JOB_SKILLS_FILE,
            source,
        })?;
        if let Some(name) = names.get(&row.skill_abr) {
            by_job.entry(row.job_id).or_default().push(name.clone());
        }
    }
    Ok(by_job)
}

/// Replaces `required_skills` with the joined skill names; postings without
/// any mapped skill end up with none.
pub fn attach_skills(listings: &mut [RawJobListing], skills: &HashMap<String, Vec<String>>) {
    for listing in listings {
        listing.required_skills = skills
            .get(listing.job_id.trim())
            .filter(|names| !names.is_empty())
            .map(|names| names.join(", "));
    }
}

/// Reads an export directory into listings ready for [`super::JobIngestor::ingest`].
pub fn load_dataset(dir: &Path, max_jobs: Option<usize>) -> Result<Vec<RawJobListing>, IngestError> {
    let postings_path = dir.join(POSTINGS_FILE);
    let postings = File::open(&postings_path).map_err(|source| IngestError::MissingFile {
        path: postings_path.display().to_string(),
        source,
    })?;
    let mut listings = read_postings(postings, max_jobs)?;
    info!(dir = %dir.display(), postings = listings.len(), "Read job postings export");

    let skills = File::open(dir.join(SKILLS_FILE)).ok();
    let job_skills = File::open(dir.join(JOB_SKILLS_FILE)).ok();
    match (skills, job_skills) {
        (Some(skills), Some(job_skills)) => {
            let names = read_skill_names(skills)?;
            let by_job = read_job_skills(job_skills, &names)?;
            attach_skills(&mut listings, &by_job);
            info!(skills = names.len(), jobs_with_skills = by_job.len(), "Joined job skills");
        }
        _ => warn!("{SKILLS_FILE} or {JOB_SKILLS_FILE} not found; keeping skills_desc"),
    }

    Ok(listings)
}
