use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::documents::DocumentError;
use crate::ingest::IngestError;
use crate::llm_client::LlmError;
use crate::rag::retriever::RetrievalError;
use crate::vector_store::VectorStoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            DocumentError::UnsupportedFormat(_) | DocumentError::Empty => {
                AppError::Validation(err.to_string())
            }
            DocumentError::Pdf(_) | DocumentError::Docx(_) | DocumentError::Encoding => {
                AppError::UnprocessableEntity(err.to_string())
            }
        }
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidBatchSize | IngestError::MissingFile { .. } => {
                AppError::Validation(err.to_string())
            }
            IngestError::MissingColumn { .. } | IngestError::Csv { .. } => {
                AppError::UnprocessableEntity(err.to_string())
            }
            IngestError::Clear(e) | IngestError::Count(e) => AppError::VectorStore(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
            ),
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Retrieval(e) => {
                tracing::error!("Retrieval error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "RETRIEVAL_ERROR",
                    "Job search is temporarily unavailable".to_string(),
                )
            }
            AppError::VectorStore(e) => {
                tracing::error!("Vector store error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "VECTOR_STORE_ERROR",
                    "The job index is temporarily unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::Validation("query cannot be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_retrieval_failure_is_service_unavailable() {
        let err = RetrievalError::Embedding(EmbeddingError::EmptyInput);
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_document_errors_map_to_client_statuses() {
        let too_large = AppError::from(DocumentError::TooLarge {
            size_bytes: 10,
            limit_bytes: 5,
        });
        assert_eq!(too_large.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);

        let unsupported = AppError::from(DocumentError::UnsupportedFormat("rtf".into()));
        assert_eq!(unsupported.into_response().status(), StatusCode::BAD_REQUEST);

        let corrupt = AppError::from(DocumentError::Docx("invalid Zip archive".into()));
        assert_eq!(corrupt.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_dataset_errors_map_to_client_statuses() {
        let missing = AppError::from(IngestError::MissingColumn {
            file: "postings.csv",
            column: "job_id",
        });
        assert_eq!(missing.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let no_file = AppError::from(IngestError::MissingFile {
            path: "data/kaggle/postings.csv".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(no_file.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
