use linkstash_core::StorageError;
use thiserror::Error;

/// Result type for shortener operations.
pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("short url not found: {0}")]
    NotFound(String),
    #[error("short url was deleted: {0}")]
    Gone(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("deletion pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("deletion queue is full")]
    Full,
    #[error("deletion pipeline is closed")]
    Closed,
}
