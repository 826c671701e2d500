use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by job index operations.
pub enum VectorStoreError {
    /// Could not connect to the Qdrant endpoint.
    #[error("failed to connect to Qdrant at '{url}': {message}")]
    ConnectionFailed { url: String, message: String },

    /// Collection creation or inspection failed.
    #[error("failed to prepare collection '{collection}': {message}")]
    CollectionFailed { collection: String, message: String },

    #[error("failed to upsert jobs to '{collection}': {message}")]
    UpsertFailed { collection: String, message: String },

    #[error("failed to search in '{collection}': {message}")]
    SearchFailed { collection: String, message: String },

    #[error("failed to read from '{collection}': {message}")]
    ReadFailed { collection: String, message: String },

    #[error("failed to delete from '{collection}': {message}")]
    DeleteFailed { collection: String, message: String },

    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// The in-memory snapshot could not be read or written.
    #[error("snapshot error at '{path}': {message}")]
    Snapshot { path: String, message: String },
}
