use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance,
    Filter, GetPointsBuilder, PointId, PointStruct, PointsIdsList, Range, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use tracing::{debug, info};
use uuid::Uuid;

use super::{IndexedJob, SearchHit, VectorIndex, VectorStoreError};
use crate::models::job::{JobFilter, JobMetadata, JobPosting};

/// Job index backed by a Qdrant collection using cosine distance.
///
/// Job ids are strings, so each point id is a UUIDv5 derived from the job id;
/// the job id itself travels in the `job_id` payload field.
pub struct QdrantJobIndex {
    client: Qdrant,
    collection: String,
    dimensions: usize,
}

impl QdrantJobIndex {
    /// Connects to `url` and creates the collection when missing.
    pub async fn connect(
        url: &str,
        collection: &str,
        dimensions: usize,
    ) -> Result<Self, VectorStoreError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| VectorStoreError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let index = Self {
            client,
            collection: collection.to_string(),
            dimensions,
        };
        index.ensure_collection().await?;
        Ok(index)
    }

    async fn ensure_collection(&self) -> Result<(), VectorStoreError> {
        let exists = self
            .client
            .collection_exists(self.collection.as_str())
            .await
            .map_err(|e| self.collection_error(e))?;

        if !exists {
            self.create_collection().await?;
        }
        Ok(())
    }

    async fn create_collection(&self) -> Result<(), VectorStoreError> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(
                        self.dimensions as u64,
                        Distance::Cosine,
                    ))
                    .on_disk_payload(true),
            )
            .await
            .map_err(|e| self.collection_error(e))?;

        info!(collection = %self.collection, dimensions = self.dimensions, "Created Qdrant collection");
        Ok(())
    }

    fn collection_error(&self, e: impl std::fmt::Display) -> VectorStoreError {
        VectorStoreError::CollectionFailed {
            collection: self.collection.clone(),
            message: e.to_string(),
        }
    }

    fn read_error(&self, e: impl std::fmt::Display) -> VectorStoreError {
        VectorStoreError::ReadFailed {
            collection: self.collection.clone(),
            message: e.to_string(),
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), VectorStoreError> {
        if vector.len() != self.dimensions {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantJobIndex {
    async fn upsert(&self, jobs: Vec<IndexedJob>) -> Result<(), VectorStoreError> {
        if jobs.is_empty() {
            return Ok(());
        }

        let mut points = Vec::with_capacity(jobs.len());
        for job in jobs {
            self.check_dimension(&job.vector)?;
            points.push(PointStruct::new(
                point_id(&job.posting.id),
                job.vector,
                job_payload(&job.posting),
            ));
        }
        let written = points.len();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| VectorStoreError::UpsertFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        debug!(collection = %self.collection, written, "Upserted job points");
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&JobFilter>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        self.check_dimension(vector)?;

        let mut search = SearchPointsBuilder::new(&self.collection, vector.to_vec(), k as u64)
            .with_payload(true);
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            search = search.filter(qdrant_filter(filter));
        }

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorStoreError::SearchFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        // Qdrant reports cosine similarity; callers work in distance.
        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                let posting = posting_from_payload(&point.payload)?;
                Some(SearchHit {
                    posting,
                    distance: 1.0 - point.score,
                })
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, VectorStoreError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(|e| self.read_error(e))?;
        Ok(response.result.map_or(0, |r| r.count as usize))
    }

    async fn get(&self, id: &str) -> Result<Option<JobPosting>, VectorStoreError> {
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(&self.collection, vec![point_id(id)]).with_payload(true),
            )
            .await
            .map_err(|e| self.read_error(e))?;

        Ok(response
            .result
            .into_iter()
            .find_map(|point| posting_from_payload(&point.payload)))
    }

    async fn delete(&self, id: &str) -> Result<bool, VectorStoreError> {
        if self.get(id).await?.is_none() {
            return Ok(false);
        }

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(PointsIdsList {
                        ids: vec![point_id(id)],
                    })
                    .wait(true),
            )
            .await
            .map_err(|e| VectorStoreError::DeleteFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;
        Ok(true)
    }

    async fn clear(&self) -> Result<(), VectorStoreError> {
        self.client
            .delete_collection(self.collection.as_str())
            .await
            .map_err(|e| VectorStoreError::DeleteFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;
        self.create_collection().await
    }
}

fn point_id(job_id: &str) -> PointId {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, job_id.as_bytes())
        .to_string()
        .into()
}

fn job_payload(posting: &JobPosting) -> HashMap<String, Value> {
    let meta = &posting.metadata;
    let mut payload: HashMap<String, Value> = HashMap::new();
    payload.insert("job_id".to_string(), posting.id.clone().into());
    payload.insert("text".to_string(), posting.text.clone().into());
    payload.insert("title".to_string(), meta.title.clone().into());
    payload.insert("company".to_string(), meta.company.clone().into());
    payload.insert("location".to_string(), meta.location.clone().into());
    if let Some(work_type) = &meta.work_type {
        payload.insert("work_type".to_string(), work_type.clone().into());
    }
    if let Some(level) = &meta.experience_level {
        payload.insert("experience_level".to_string(), level.clone().into());
    }
    if let Some(min) = meta.salary_min {
        payload.insert("salary_min".to_string(), min.into());
    }
    if let Some(max) = meta.salary_max {
        payload.insert("salary_max".to_string(), max.into());
    }
    if let Some(remote) = meta.remote_allowed {
        payload.insert("remote_allowed".to_string(), remote.into());
    }
    payload
}

fn posting_from_payload(payload: &HashMap<String, Value>) -> Option<JobPosting> {
    let text_field = |key: &str| payload.get(key).and_then(|v| v.as_str()).cloned();
    let number_field = |key: &str| {
        payload
            .get(key)
            .and_then(|v| v.as_double().or_else(|| v.as_integer().map(|i| i as f64)))
    };

    Some(JobPosting {
        id: text_field("job_id")?,
        text: text_field("text")?,
        metadata: JobMetadata {
            title: text_field("title").unwrap_or_default(),
            company: text_field("company").unwrap_or_default(),
            location: text_field("location").unwrap_or_default(),
            work_type: text_field("work_type"),
            experience_level: text_field("experience_level"),
            salary_min: number_field("salary_min"),
            salary_max: number_field("salary_max"),
            remote_allowed: payload.get("remote_allowed").and_then(|v| v.as_bool()),
        },
    })
}

fn qdrant_filter(filter: &JobFilter) -> Filter {
    let mut conditions = Vec::new();
    let keyword_fields = [
        ("location", &filter.location),
        ("company", &filter.company),
        ("work_type", &filter.work_type),
        ("experience_level", &filter.experience_level),
    ];
    for (field, value) in keyword_fields {
        if let Some(value) = value {
            conditions.push(Condition::matches(field, value.clone()));
        }
    }
    if let Some(remote) = filter.remote_allowed {
        conditions.push(Condition::matches("remote_allowed", remote));
    }
    if let Some(floor) = filter.min_salary {
        conditions.push(Condition::range(
            "salary_max",
            Range {
                gte: Some(floor),
                ..Default::default()
            },
        ));
    }
    Filter::must(conditions)
}
