//! Capability traits the core calls and external collaborators implement.
//!
//! Embedding and generation models are black boxes behind these traits; the
//! engine never links an inference runtime. Implementations live in
//! `guichet-backends`, test doubles live next to the tests that use them.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AnswerResult, StrategyKind};

/// Maps text to a fixed-length vector for similarity comparison.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed one text. Fails with [`crate::GuichetError::EmbeddingFailure`]
    /// when the model cannot process the input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Per-call generation knobs. Strategies pass their own values; the
/// defaults are a reasonable middle ground for ad-hoc calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { max_tokens: 500, temperature: 0.5 }
    }
}

/// Output of one generative completion.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    /// Backend self-reported confidence, when the API exposes one.
    pub confidence: Option<f32>,
}

/// Output of one extractive question-answering call.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Verbatim span lifted from the context.
    pub span: String,
    pub score: f32,
}

/// A model capable of generative completion and span extraction.
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    /// Backend identifier for logs and reports.
    fn name(&self) -> &str;

    /// Generative completion. `instructions`, when present, is delivered as
    /// the steering (system) message; `prompt` is the user-visible content.
    /// Fails with `GenerationFailure` or `RateLimited`.
    async fn generate(
        &self,
        prompt: &str,
        instructions: Option<&str>,
        opts: &GenerateOptions,
    ) -> Result<Generation>;

    /// Extract the best answer span for `question` out of `context`.
    /// Fails analogously to [`Self::generate`].
    async fn extract(&self, question: &str, context: &str) -> Result<Extraction>;
}

/// One interchangeable answering strategy.
///
/// `answer` returns `Err` only for an unusable question
/// (`InvalidArgument`); every backend-side failure is folded into the
/// returned [`AnswerResult`] with its `error` tag set, so callers always
/// have a record to score.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn answer(&self, question: &str) -> Result<AnswerResult>;
}
