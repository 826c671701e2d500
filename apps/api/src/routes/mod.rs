pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::agents::handlers as agents;
use crate::documents::handlers as documents;
use crate::ingest::handlers as jobs;
use crate::matching::handlers as matching;
use crate::state::AppState;

/// Multipart framing allowance on top of the configured upload size.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes() + UPLOAD_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Chat
        .route("/api/v1/chat", post(agents::handle_chat))
        // Job matching
        .route("/api/v1/jobs/match", post(matching::handle_match_jobs))
        .route("/api/v1/jobs/top-matches", post(matching::handle_top_matches))
        .route("/api/v1/jobs/search", post(matching::handle_search_jobs))
        .route(
            "/api/v1/jobs/:id/analysis",
            post(matching::handle_analyze_job),
        )
        // Job corpus
        .route(
            "/api/v1/jobs",
            post(jobs::handle_ingest_jobs).delete(jobs::handle_clear_jobs),
        )
        .route("/api/v1/jobs/import", post(jobs::handle_import_jobs))
        .route("/api/v1/jobs/stats", get(jobs::handle_job_stats))
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job).delete(jobs::handle_delete_job),
        )
        // Resumes and interviews
        .route(
            "/api/v1/resumes/upload",
            post(documents::handle_upload_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/resumes/review", post(agents::handle_review_resume))
        .route("/api/v1/interviews/prep", post(agents::handle_interview_prep))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::agents::{Assistant, InterviewCoach, ResumeCoach, Supervisor};
    use crate::config::Config;
    use crate::embedding::mock::FixedEmbedder;
    use crate::ingest::JobIngestor;
    use crate::llm_client::mock::ScriptedCompletion;
    use crate::matching::JobMatchRanker;
    use crate::models::job::sample_job;
    use crate::rag::retriever::test_support::{vector_with_similarity, QUERY};
    use crate::rag::retriever::Retriever;
    use crate::vector_store::{IndexedJob, MemoryJobIndex, VectorIndex};

    async fn app() -> Router {
        app_with_data_dir("data/kaggle").await
    }

    async fn app_with_data_dir(data_dir: &str) -> Router {
        let data_dir = data_dir.to_string();
        let config = Config::from_lookup(move |key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "PRIMARY_LLM" => Some("openai".to_string()),
            "KAGGLE_DATA_DIR" => Some(data_dir.clone()),
            _ => None,
        })
        .unwrap();

        let index: Arc<dyn VectorIndex> = Arc::new(MemoryJobIndex::new(2));
        index
            .upsert(vec![
                IndexedJob {
                    posting: sample_job("job_1", "Rust Engineer"),
                    vector: vector_with_similarity(0.9),
                },
                IndexedJob {
                    posting: sample_job("job_2", "Data Engineer"),
                    vector: vector_with_similarity(0.7),
                },
            ])
            .await
            .unwrap();
        let embedder = Arc::new(FixedEmbedder::new(QUERY.to_vec()));
        let llm = Arc::new(ScriptedCompletion::always("**Overall Match Score:** 80%"));

        let retriever = Retriever::new(index.clone(), embedder.clone());
        let assistant = Assistant {
            supervisor: Supervisor::new(llm.clone()),
            ranker: JobMatchRanker::new(retriever.clone(), llm.clone(), config.matching.clone()),
            resume_coach: ResumeCoach::new(retriever.clone(), llm.clone()),
            interview_coach: InterviewCoach::new(retriever, llm),
        };

        build_router(AppState {
            config,
            assistant,
            ingestor: JobIngestor::new(index, embedder),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_corpus_size() {
        let (status, body) = send(app().await, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["total_jobs"], 2);
    }

    #[tokio::test]
    async fn test_get_job_and_missing_job() {
        let app = app().await;

        let (status, body) = send(app.clone(), get("/api/v1/jobs/job_1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["title"], "Rust Engineer");

        let (status, body) = send(app, get("/api/v1/jobs/job_404")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_stats_route_is_not_shadowed_by_job_id() {
        let (status, body) = send(app().await, get("/api/v1/jobs/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_jobs"], 2);
    }

    #[tokio::test]
    async fn test_import_loads_kaggle_export() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("postings.csv"),
            "job_id,title,company_name,location,description\n\
             301,Platform Engineer,Acme,Remote,Run the Kubernetes fleet and the deploy pipeline for every team.\n\
             302,Data Engineer,Globex,Austin,Build batch and streaming pipelines feeding the analytics warehouse.\n",
        )
        .unwrap();
        let app = app_with_data_dir(dir.path().to_str().unwrap()).await;

        let (status, body) = send(
            app.clone(),
            post_json("/api/v1/jobs/import", json!({ "max_jobs": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["received"], 1);
        assert_eq!(body["loaded"], 1);
        assert_eq!(body["total_jobs"], 3);

        let (status, body) = send(app, get("/api/v1/jobs/job_301")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["title"], "Platform Engineer");
    }

    #[tokio::test]
    async fn test_import_without_export_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_data_dir(dir.path().to_str().unwrap()).await;

        let (status, body) = send(app, post_json("/api/v1/jobs/import", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_chat_rejects_blank_query() {
        let (status, body) = send(
            app().await,
            post_json("/api/v1/chat", json!({ "query": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_chat_greeting_goes_to_general_agent() {
        let (status, body) = send(
            app().await,
            post_json("/api/v1/chat", json!({ "query": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["agent"], "general");
    }

    #[tokio::test]
    async fn test_search_returns_hits_and_context() {
        let (status, body) = send(
            app().await,
            post_json("/api/v1/jobs/search", json!({ "query": "rust", "n_results": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["candidates"][0]["job"]["id"], "job_1");
        assert!(body["context"].as_str().unwrap().starts_with("[Document 1]"));
    }

    #[tokio::test]
    async fn test_match_endpoint_returns_report_and_markdown() {
        let (status, body) = send(
            app().await,
            post_json(
                "/api/v1/jobs/match",
                json!({ "resume_text": "Skills: Rust, Postgres", "n_results": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["matches"].as_array().unwrap().len(), 1);
        assert!(body["markdown"].as_str().unwrap().contains("Job #1"));
    }

    fn multipart_upload(file_name: &str, content: &[u8]) -> Request<Body> {
        let boundary = "compass-test-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/resumes/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_parses_docx_resume() {
        let docx = crate::documents::docx::test_support::docx_with_body(
            "<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>\
             <w:p><w:r><w:t>jane@example.com</w:t></w:r></w:p>",
        );

        let (status, body) = send(app().await, multipart_upload("cv.docx", &docx)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["format"], "docx");
        assert_eq!(body["text"], "Jane Doe\njane@example.com");
        assert_eq!(body["metadata"]["email"], "jane@example.com");
    }

    #[tokio::test]
    async fn test_upload_unsupported_format_rejected() {
        let (status, body) = send(app().await, multipart_upload("cv.rtf", b"{\\rtf1 Jane}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
