//! Guichet error taxonomy.
//!
//! Transient variants (embedding, generation, rate limit) are retried by the
//! strategy layer; `BackendUnavailable` is what exhausted retries collapse
//! into, and it surfaces as a field on `AnswerResult`, never as a panic or an
//! error crossing the strategy boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GuichetError>;

#[derive(Debug, Error)]
pub enum GuichetError {
    /// Bad caller input (blank question, out-of-range top_k). Never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedder could not produce a vector. Transient.
    #[error("embedding failure: {0}")]
    EmbeddingFailure(String),

    /// The generative or extractive backend call failed. Transient.
    #[error("generation failure: {0}")]
    GenerationFailure(String),

    /// Backend signalled throttling (HTTP 429). Transient.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Retries exhausted; the backend is down for this call.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Configuration file or value problem.
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected defect. Caught and recorded at the benchmark pair boundary.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GuichetError {
    /// Whether the strategy layer should retry this error with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingFailure(_) | Self::GenerationFailure(_) | Self::RateLimited(_)
        )
    }

    /// The lightweight tag recorded on failed `AnswerResult`s.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::EmbeddingFailure(_) => ErrorKind::EmbeddingFailure,
            Self::GenerationFailure(_) => ErrorKind::GenerationFailure,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Error tag carried by benchmark records and answer payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    EmbeddingFailure,
    GenerationFailure,
    RateLimited,
    BackendUnavailable,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidArgument => "invalid_argument",
            Self::EmbeddingFailure => "embedding_failure",
            Self::GenerationFailure => "generation_failure",
            Self::RateLimited => "rate_limited",
            Self::BackendUnavailable => "backend_unavailable",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}
