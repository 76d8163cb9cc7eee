//! # Guichet Strategy
//!
//! The three interchangeable answering strategies and their shared policy
//! machinery.
//!
//! ## Design
//! - **One trait, three implementations** — [`LlmOnly`], [`Rag`] and
//!   [`ExtractiveQa`] are picked at construction time, never by runtime type
//!   inspection.
//! - **Failures become results** — transient backend errors are retried with
//!   backoff; exhaustion yields an `AnswerResult` tagged
//!   `BackendUnavailable`, never a panic or error escaping `answer()`.
//! - **Honest confidence** — the ignorance override replaces the text, not
//!   the calibration: callers always see the computed confidence.

pub mod extractive;
pub mod llm_only;
pub mod policy;
pub mod prompts;
pub mod rag;
pub mod retry;

use std::sync::Arc;
use std::time::Instant;

use guichet_core::config::GuichetConfig;
use guichet_core::error::{GuichetError, Result};
use guichet_core::traits::{AnswerBackend, Strategy, TextEmbedder};
use guichet_core::types::{AnswerResult, StrategyKind};
use guichet_index::RetrievalIndex;

pub use extractive::ExtractiveQa;
pub use llm_only::LlmOnly;
pub use policy::ConfidencePolicy;
pub use rag::Rag;
pub use retry::RetryPolicy;

/// Reject blank questions before any clock starts or backend is touched.
pub(crate) fn validate_question(question: &str) -> Result<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(GuichetError::InvalidArgument("question must not be empty".into()));
    }
    Ok(trimmed)
}

pub(crate) fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Terminal result for a produce() error: sentinel confidence, error tag,
/// safe French message.
pub(crate) fn failure_result(kind: StrategyKind, err: &GuichetError) -> AnswerResult {
    tracing::warn!(strategy = %kind, error = %err, "strategy failed, returning terminal result");
    AnswerResult::failed(kind, err.kind(), prompts::BACKEND_FAILURE_MESSAGE)
}

/// Build one strategy from configuration and shared capabilities.
pub fn build_strategy(
    kind: StrategyKind,
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<RetrievalIndex>,
    backend: Arc<dyn AnswerBackend>,
    config: &GuichetConfig,
) -> Result<Arc<dyn Strategy>> {
    let policy = ConfidencePolicy::new(config.answer.confidence_threshold)?;
    let retry = RetryPolicy::from_config(&config.answer);
    let top_k = config.retrieval.top_k;

    let strategy: Arc<dyn Strategy> = match kind {
        StrategyKind::LlmOnly => Arc::new(LlmOnly::new(backend, policy, retry)),
        StrategyKind::Rag => Arc::new(Rag::new(embedder, index, backend, policy, retry, top_k)?),
        StrategyKind::ExtractiveQa => {
            Arc::new(ExtractiveQa::new(embedder, index, backend, policy, retry, top_k)?)
        }
    };
    Ok(strategy)
}

/// Build all three strategies over the same capabilities, in
/// [`StrategyKind::ALL`] order — what the benchmark runs.
pub fn build_all(
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<RetrievalIndex>,
    backend: Arc<dyn AnswerBackend>,
    config: &GuichetConfig,
) -> Result<Vec<Arc<dyn Strategy>>> {
    StrategyKind::ALL
        .into_iter()
        .map(|kind| {
            build_strategy(kind, embedder.clone(), index.clone(), backend.clone(), config)
        })
        .collect()
}
