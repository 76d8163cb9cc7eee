//! Strategy C — extractive question answering over retrieved FAQ answers.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use guichet_core::error::{GuichetError, Result};
use guichet_core::traits::{AnswerBackend, Strategy, TextEmbedder};
use guichet_core::types::{AnswerResult, StrategyKind};
use guichet_index::RetrievalIndex;

use crate::policy::ConfidencePolicy;
use crate::retry::RetryPolicy;
use crate::{elapsed_ms, failure_result, validate_question};

/// Spans scoring under this are treated as extraction noise.
const MIN_SPAN_SCORE: f32 = 0.01;
/// Discount applied to the retrieval score when falling back to the stored
/// answer instead of an extracted span.
const FALLBACK_DISCOUNT: f32 = 0.5;

/// Runs the extractive model once per retrieved entry and keeps the single
/// best-scoring span. The answer is always verbatim FAQ text.
pub struct ExtractiveQa {
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<RetrievalIndex>,
    backend: Arc<dyn AnswerBackend>,
    policy: ConfidencePolicy,
    retry: RetryPolicy,
    top_k: usize,
}

impl ExtractiveQa {
    /// `top_k` is clamped to the index size; an empty index is refused.
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        index: Arc<RetrievalIndex>,
        backend: Arc<dyn AnswerBackend>,
        policy: ConfidencePolicy,
        retry: RetryPolicy,
        top_k: usize,
    ) -> Result<Self> {
        if index.is_empty() {
            return Err(GuichetError::Config(
                "cannot build the extractive_qa strategy over an empty index".into(),
            ));
        }
        if top_k == 0 {
            return Err(GuichetError::InvalidArgument("top_k must be ≥ 1".into()));
        }
        let top_k = top_k.min(index.len());
        Ok(Self { embedder, index, backend, policy, retry, top_k })
    }

    async fn produce(&self, question: &str) -> Result<AnswerResult> {
        let query = self
            .retry
            .run("embedding", || self.embedder.embed(question))
            .await?;
        let hits = self.index.search(&query, self.top_k)?;
        let best_score = hits.first().map(|h| h.score).unwrap_or(0.0);

        // One extraction per retrieved entry; strictly-greater keeps the
        // earliest (best-ranked) winner on ties, so output is deterministic.
        let mut winner: Option<(String, guichet_core::traits::Extraction)> = None;
        for hit in &hits {
            let extraction = self
                .retry
                .run("extraction", || self.backend.extract(question, &hit.entry.answer))
                .await?;
            debug!(entry_id = %hit.entry.id, score = extraction.score, "span extracted");
            let better = match &winner {
                None => true,
                Some((_, best)) => extraction.score > best.score,
            };
            if better {
                winner = Some((hit.entry.id.clone(), extraction));
            }
        }

        let (source_id, extraction) = winner.ok_or_else(|| {
            GuichetError::Internal("extraction loop produced no candidate".into())
        })?;

        if extraction.span.trim().is_empty() || extraction.score < MIN_SPAN_SCORE {
            // Nothing usable extracted: show the best entry's stored answer
            // at a discounted confidence instead of an empty span.
            let top = &hits[0];
            return Ok(AnswerResult::new(
                StrategyKind::ExtractiveQa,
                top.entry.answer.clone(),
                best_score * FALLBACK_DISCOUNT,
            )
            .with_sources(vec![top.entry.id.clone()]));
        }

        Ok(
            AnswerResult::new(StrategyKind::ExtractiveQa, extraction.span, extraction.score)
                .with_sources(vec![source_id]),
        )
    }
}

#[async_trait]
impl Strategy for ExtractiveQa {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ExtractiveQa
    }

    async fn answer(&self, question: &str) -> Result<AnswerResult> {
        let question = validate_question(question)?;
        let started = Instant::now();
        let result = match self.produce(question).await {
            Ok(candidate) => self.policy.apply(candidate),
            Err(e) => failure_result(StrategyKind::ExtractiveQa, &e),
        };
        Ok(result.with_latency(elapsed_ms(started)))
    }
}
